//! Flat and tree views over a resource's file list.

use crate::error::{Error, Result};
use crate::media::{media_format_by_ext, mime_type_by_ext, MediaFormat};
use crate::models::{ListItem, ListItemKind, ListResponse};
use crate::params::ParamSource;
use crate::resource::{sha1_hex, Resource, ResourceFile};

/// Listing output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOutput {
    /// Flat walk with one Directory item per intermediate directory.
    #[default]
    List,
    /// One level of the hierarchy with deeper entries rolled up.
    Tree,
}

/// Validated listing arguments.
///
/// `limit` zero means unlimited; the HTTP surface never produces it but
/// internal lookups rely on it.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub limit: usize,
    pub offset: usize,
    pub output: ListOutput,
    pub path: Vec<String>,
}

impl ListArgs {
    /// Parses and validates listing arguments from request parameters.
    ///
    /// # Errors
    /// - [`Error::QueryParse`] when `limit`, `offset` or `output` is out of
    ///   range or malformed
    pub fn from_params(params: &dyn ParamSource) -> Result<Self> {
        let output = match params.query("output").unwrap_or("") {
            "tree" => ListOutput::Tree,
            "list" | "" => ListOutput::List,
            _ => {
                return Err(Error::QueryParse {
                    what: "output",
                    requirement: "tree or list",
                })
            }
        };
        let limit = match params.query("limit") {
            None => 1000,
            Some(raw) => {
                let limit: i64 = raw.parse().map_err(|_| Error::QueryParse {
                    what: "limit",
                    requirement: "integer",
                })?;
                if limit > 1000 {
                    return Err(Error::QueryParse {
                        what: "limit",
                        requirement: "less than 1000",
                    });
                }
                if limit < 1 {
                    return Err(Error::QueryParse {
                        what: "limit",
                        requirement: "more than 1",
                    });
                }
                limit as usize
            }
        };
        let offset = match params.query("offset") {
            None => 0,
            Some(raw) => {
                let offset: i64 = raw.parse().map_err(|_| Error::QueryParse {
                    what: "offset",
                    requirement: "integer",
                })?;
                if offset < 0 {
                    return Err(Error::QueryParse {
                        what: "offset",
                        requirement: "positive",
                    });
                }
                offset as usize
            }
        };
        let trimmed = params.query("path").unwrap_or("").trim_matches('/');
        let path = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(str::to_string).collect()
        };
        Ok(Self {
            limit,
            offset,
            output,
            path,
        })
    }
}

/// Builds listing views of a resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct List;

impl List {
    /// Builds the requested view. The response's own item describes the
    /// requested prefix, its `count` is the total before pagination.
    pub fn get(&self, resource: &Resource, args: &ListArgs) -> ListResponse {
        match args.output {
            ListOutput::List => self.build_list(resource, args),
            ListOutput::Tree => self.build_tree(resource, args),
        }
    }

    fn build_list(&self, resource: &Resource, args: &ListArgs) -> ListResponse {
        let mut items = Vec::new();
        let mut count: usize = 0;
        let mut size: i64 = 0;
        let mut dirs: Vec<Vec<String>> = Vec::new();
        for file in &resource.files {
            if !path_begins_with(&file.path, &args.path) {
                continue;
            }
            if file.path.len() > args.path.len() {
                let mut rel: Vec<String> = Vec::new();
                for segment in &file.path[args.path.len()..file.path.len() - 1] {
                    rel.push(segment.clone());
                    if dirs.contains(&rel) {
                        continue;
                    }
                    dirs.push(rel.clone());
                    count += 1;
                    if paginated_out(count, args) {
                        continue;
                    }
                    let mut full = args.path.clone();
                    full.extend(rel.iter().cloned());
                    let path_str = format!("/{}", full.join("/"));
                    items.push(ListItem {
                        id: sha1_hex(&path_str),
                        name: rel.last().cloned().unwrap_or_default(),
                        size: self.dir_size(resource, &full),
                        path_str,
                        path: full,
                        kind: ListItemKind::Directory,
                        media_format: None,
                        mime_type: None,
                        ext: String::new(),
                    });
                }
            }
            count += 1;
            size += file.size;
            if paginated_out(count, args) {
                continue;
            }
            items.push(build_file_item(file));
        }
        ListResponse {
            item: root_item(&args.path, size),
            items,
            count,
        }
    }

    fn build_tree(&self, resource: &Resource, args: &ListArgs) -> ListResponse {
        let mut items: Vec<ListItem> = Vec::new();
        let mut size: i64 = 0;
        let mut dir: Option<ListItem> = None;
        for file in &resource.files {
            if !path_begins_with(&file.path, &args.path) || file.path.len() <= args.path.len() {
                continue;
            }
            size += file.size;
            if args.path.len() + 1 == file.path.len() {
                if let Some(done) = dir.take() {
                    items.push(done);
                }
                items.push(build_file_item(file));
                continue;
            }
            let child_path = &file.path[..args.path.len() + 1];
            let path_str = format!("/{}", child_path.join("/"));
            match &mut dir {
                Some(current) if current.path_str == path_str => current.size += file.size,
                _ => {
                    if let Some(done) = dir.take() {
                        items.push(done);
                    }
                    dir = Some(ListItem {
                        id: sha1_hex(&path_str),
                        name: file.path[args.path.len()].clone(),
                        size: file.size,
                        path_str,
                        path: child_path.to_vec(),
                        kind: ListItemKind::Directory,
                        media_format: None,
                        mime_type: None,
                        ext: String::new(),
                    });
                }
            }
        }
        if let Some(done) = dir.take() {
            items.push(done);
        }
        let count = items.len();
        let items = if args.offset > 0 || (args.limit != 0 && args.offset + args.limit < items.len())
        {
            items
                .into_iter()
                .skip(args.offset)
                .take(args.limit)
                .collect()
        } else {
            items
        };
        ListResponse {
            item: root_item(&args.path, size),
            items,
            count,
        }
    }

    fn dir_size(&self, resource: &Resource, prefix: &[String]) -> i64 {
        let mut size = 0;
        for file in &resource.files {
            if !path_begins_with(&file.path, prefix) {
                // Files are declared contiguously per directory; once a
                // matching run ends, nothing later can match.
                if size > 0 {
                    break;
                }
                continue;
            }
            size += file.size;
        }
        size
    }
}

fn paginated_out(count: usize, args: &ListArgs) -> bool {
    count - 1 < args.offset || (args.limit != 0 && count > args.offset + args.limit)
}

fn path_begins_with(source: &[String], start: &[String]) -> bool {
    if start.is_empty() {
        return true;
    }
    for (i, segment) in source.iter().enumerate() {
        if start.len() <= i {
            break;
        }
        if start[i] != *segment {
            return false;
        }
    }
    true
}

fn root_item(path: &[String], size: i64) -> ListItem {
    let path_str = format!("/{}", path.join("/"));
    ListItem {
        id: sha1_hex(&path_str),
        name: String::new(),
        size,
        path_str,
        path: path.to_vec(),
        kind: ListItemKind::Directory,
        media_format: None,
        mime_type: None,
        ext: String::new(),
    }
}

fn build_file_item(file: &ResourceFile) -> ListItem {
    let path_str = format!("/{}", file.path.join("/"));
    let name = file.path.last().cloned().unwrap_or_default();
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let format = media_format_by_ext(&ext);
    let (media_format, mime_type) = if format == MediaFormat::Unknown {
        (None, None)
    } else {
        (Some(format), mime_type_by_ext(&ext))
    };
    ListItem {
        id: sha1_hex(&path_str),
        name,
        size: file.size,
        path_str,
        path: file.path.clone(),
        kind: ListItemKind::File,
        media_format,
        mime_type,
        ext,
    }
}
