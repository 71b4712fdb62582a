use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info};

use crate::app::CapabilitySet;
use crate::AppPaths;

use super::database::{ConfigDatabase, ConfigurationAsset, ConfigurationAssetBuilder, ParamValue};
use super::discovery::discover_content_sources;
use super::types::{ContentPlanError, ContentRequest};

const DEF_ELEMENT: &str = "ConfigDef";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateParam,
    DuplicateDefInMod,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

/// Error context for one XML file.
struct FileContext<'a> {
    mod_id: &'a str,
    file_path: &'a Path,
}

impl FileContext<'_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        doc: &Document<'_>,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let pos = doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

pub fn compile_config_database(
    app_paths: &AppPaths,
    request: &ContentRequest,
) -> Result<ConfigDatabase, ContentCompileError> {
    let sources = discover_content_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;
    let source_count = sources.len();

    let mut merged = BTreeMap::<String, ConfigurationAsset>::new();
    let mut overrides = 0usize;

    for source in sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.source_id, error.path, error.source))?;
        let mut seen_in_source = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.source_id, xml_file.clone(), source_err))?;
            let context = FileContext {
                mod_id: &source.source_id,
                file_path: &xml_file,
            };
            let defs = parse_defs_document(&context, &raw)?;
            for def in defs {
                let def_name = def.def_name().to_string();
                if !seen_in_source.insert(def_name.clone()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate {DEF_ELEMENT} '{}' in mod '{}'; each mod may define a defName only once",
                            def_name, source.source_id
                        ),
                        mod_id: source.source_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                if merged.insert(def_name.clone(), def).is_some() {
                    overrides += 1;
                    debug!(
                        def_name = %def_name,
                        mod_id = %source.source_id,
                        load_index = source.load_index,
                        "config_def_overridden"
                    );
                }
            }
        }
    }

    let database = ConfigDatabase::from_assets(merged.into_values().collect());
    info!(
        defs = database.len(),
        sources = source_count,
        overrides,
        "content_loaded"
    );
    Ok(database)
}

fn parse_defs_document(
    context: &FileContext<'_>,
    raw: &str,
) -> Result<Vec<ConfigurationAsset>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: context.mod_id.to_string(),
        file_path: context.file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(context.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            &doc,
            root,
        ));
    }

    let mut defs = Vec::<ConfigurationAsset>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != DEF_ELEMENT {
            return Err(context.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <{DEF_ELEMENT}> is supported",
                    child.tag_name().name()
                ),
                &doc,
                child,
            ));
        }
        defs.push(parse_config_def(context, &doc, child)?);
    }

    Ok(defs)
}

fn parse_config_def(
    context: &FileContext<'_>,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<ConfigurationAsset, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut capabilities = CapabilitySet::EMPTY;
    let mut params = Vec::<(String, ParamValue)>::new();

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(context.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <{DEF_ELEMENT}>"),
                doc,
                field,
            ));
        }

        match field_name.as_str() {
            "defName" => {
                def_name = Some(required_text(context, doc, field, "defName")?);
            }
            "label" => {
                label = Some(required_text(context, doc, field, "label")?);
            }
            "capabilities" => {
                let raw = field.text().unwrap_or_default();
                capabilities = CapabilitySet::parse_list(raw).map_err(|error| {
                    context.error_at(
                        ContentErrorCode::InvalidValue,
                        format!(
                            "{error}; allowed values: damageable, collectable, interactable, player"
                        ),
                        doc,
                        field,
                    )
                })?;
            }
            "params" => {
                params = parse_params(context, doc, field)?;
            }
            _ => {
                return Err(context.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <{DEF_ELEMENT}>"),
                    doc,
                    field,
                ))
            }
        }
    }

    let Some(def_name) = def_name else {
        return Err(context.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <defName> in <{DEF_ELEMENT}>"),
            doc,
            node,
        ));
    };
    let Some(label) = label else {
        return Err(context.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <label> in <{DEF_ELEMENT}>"),
            doc,
            node,
        ));
    };

    let mut builder = ConfigurationAssetBuilder::new(def_name)
        .label(label)
        .capabilities(capabilities);
    for (key, value) in params {
        builder = builder.param(key, value);
    }
    Ok(builder.build())
}

fn parse_params(
    context: &FileContext<'_>,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<Vec<(String, ParamValue)>, ContentCompileError> {
    let mut seen_keys = HashSet::<String>::new();
    let mut params = Vec::new();

    for param in node.children().filter(|child| child.is_element()) {
        let kind = param.tag_name().name();
        if !matches!(kind, "float" | "text" | "flag" | "mask") {
            return Err(context.error_at(
                ContentErrorCode::UnknownField,
                format!("unknown param type <{kind}>; expected float, text, flag or mask"),
                doc,
                param,
            ));
        }

        let key = param
            .attribute("key")
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                context.error_at(
                    ContentErrorCode::MissingField,
                    format!("<{kind}> param requires a non-empty key attribute"),
                    doc,
                    param,
                )
            })?
            .to_string();

        if !seen_keys.insert(key.clone()) {
            return Err(context.error_at(
                ContentErrorCode::DuplicateParam,
                format!("duplicate param key '{key}'"),
                doc,
                param,
            ));
        }

        let raw = param.text().map(str::trim).unwrap_or_default();
        let value = match kind {
            "float" => {
                let parsed = raw.parse::<f32>().ok().filter(|value| value.is_finite());
                let Some(parsed) = parsed else {
                    return Err(context.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("param '{key}' value '{raw}' is not a finite number"),
                        doc,
                        param,
                    ));
                };
                ParamValue::Float(parsed)
            }
            "flag" => match raw.to_ascii_lowercase().as_str() {
                "true" => ParamValue::Flag(true),
                "false" => ParamValue::Flag(false),
                _ => {
                    return Err(context.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("param '{key}' value '{raw}' must be true or false"),
                        doc,
                        param,
                    ))
                }
            },
            "mask" => ParamValue::Mask(CapabilitySet::parse_list(raw).map_err(|error| {
                context.error_at(
                    ContentErrorCode::InvalidValue,
                    format!("param '{key}': {error}"),
                    doc,
                    param,
                )
            })?),
            _ => ParamValue::Text(raw.to_string()),
        };
        params.push((key, value));
    }

    Ok(params)
}

fn required_text(
    context: &FileContext<'_>,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(context.error_at(
            ContentErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            doc,
            node,
        ));
    }
    Ok(value)
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path.as_path())));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML content: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: ContentPlanError, root: &Path) -> ContentCompileError {
    match error {
        ContentPlanError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check ARCADE_ENABLED_MODS",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}
