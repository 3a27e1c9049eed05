use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::app::RenderableKind;
use crate::sprite_keys::{sprite_key_for_def_name, validate_sprite_key};
use crate::AppPaths;

use super::database::{DefDatabase, EntityArchetype, EntityDefId};
use super::discovery::{discover_mod_sources, ModSource};
use super::hashing::collect_xml_files;
use super::types::{ContentPlanError, ContentPlanRequest};

const DEFAULT_COLOR: [u8; 3] = [220, 220, 220];
const DEFAULT_SIZE: f32 = 0.5;
const DEFAULT_MOVE_SPEED: f32 = 5.0;

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
        write!(
            f,
            "{:?}: {} (mod={}, file={}",
            self.code,
            self.message,
            self.mod_id,
            self.file_path.display()
        )?;
        if let Some(loc) = self.location {
            write!(f, ", line={}, column={}", loc.line, loc.column)?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for ContentCompileError {}

pub fn compile_def_database(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<DefDatabase, ContentCompileError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;
    compile_sources(&sources)
}

pub(crate) fn compile_sources(sources: &[ModSource]) -> Result<DefDatabase, ContentCompileError> {
    let mut merged = BTreeMap::<String, EntityArchetype>::new();

    for source in sources {
        let xml_files = collect_xml_files(&source.source_dir)
            .map_err(|error| map_discovery_error(error, &source.source_dir))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for (_, xml_file) in xml_files {
            let raw = fs::read_to_string(&xml_file).map_err(|source_err| ContentCompileError {
                code: ContentErrorCode::ReadFile,
                message: format!("failed to read XML file: {source_err}"),
                mod_id: source.mod_id.clone(),
                file_path: xml_file.clone(),
                location: None,
            })?;
            for def in parse_defs_document(&source.mod_id, &xml_file, &raw)? {
                if !seen_in_mod.insert(def.def_name.clone()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateDefInMod,
                        message: format!(
                            "duplicate EntityDef '{}' in mod '{}'; each mod may define a defName only once",
                            def.def_name, source.mod_id
                        ),
                        mod_id: source.mod_id.clone(),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                // Cross-mod duplicates are override points: the later mod wins.
                merged.insert(def.def_name.clone(), def);
            }
        }
    }

    Ok(DefDatabase::from_entity_defs(merged.into_values().collect()))
}

struct ParseContext<'a, 'doc, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'doc Document<'input>,
}

impl ParseContext<'_, '_, '_> {
    fn error_at(&self, code: ContentErrorCode, message: String, node: Node<'_, '_>) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        let location = Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        });
        ContentCompileError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location,
        }
    }

    fn required_text(&self, node: Node<'_, '_>, field_name: &str) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn parse_number<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<T, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        value.parse::<T>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{field_name} '{value}' is not a valid number"),
                node,
            )
        })
    }

    fn parse_finite(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
        min_exclusive: bool,
    ) -> Result<f32, ContentCompileError> {
        let parsed = self.parse_number::<f32>(node, field_name)?;
        let in_range = if min_exclusive { parsed > 0.0 } else { parsed >= 0.0 };
        if !parsed.is_finite() || !in_range {
            let bound = if min_exclusive { "> 0" } else { ">= 0" };
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{field_name} must be finite and {bound}"),
                node,
            ));
        }
        Ok(parsed)
    }

    fn parse_positive_u32(&self, node: Node<'_, '_>, field_name: &str) -> Result<u32, ContentCompileError> {
        let parsed = self.parse_number::<u32>(node, field_name)?;
        if parsed == 0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{field_name} must be > 0"),
                node,
            ));
        }
        Ok(parsed)
    }
}

fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<EntityArchetype>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = ParseContext {
        mod_id,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "EntityDef" {
            return Err(ctx.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <EntityDef> is supported",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push(parse_entity_def(&ctx, child)?);
    }
    Ok(defs)
}

fn parse_entity_def(
    ctx: &ParseContext<'_, '_, '_>,
    node: Node<'_, '_>,
) -> Result<EntityArchetype, ContentCompileError> {
    let mut seen_fields = HashSet::<&str>::new();
    let mut def_name: Option<String> = None;
    let mut label: Option<String> = None;
    let mut renderable: Option<(String, Node<'_, '_>)> = None;
    let mut sprite: Option<String> = None;
    let mut def = EntityArchetype {
        id: EntityDefId(0),
        def_name: String::new(),
        label: String::new(),
        renderable: RenderableKind::Placeholder,
        color: DEFAULT_COLOR,
        size: DEFAULT_SIZE,
        move_speed: DEFAULT_MOVE_SPEED,
        health: None,
        damage: None,
        capacity: None,
        cost: None,
        attack_range: None,
        attack_cooldown_ticks: None,
        food_value: None,
        tags: Vec::new(),
    };

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        if !seen_fields.insert(field_name) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <EntityDef>"),
                field,
            ));
        }

        match field_name {
            "defName" => def_name = Some(ctx.required_text(field, field_name)?),
            "label" => label = Some(ctx.required_text(field, field_name)?),
            "renderable" => renderable = Some((ctx.required_text(field, field_name)?, field)),
            "sprite" => {
                let key = ctx.required_text(field, field_name)?;
                validate_sprite_key(&key).map_err(|error| {
                    ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("invalid sprite key '{key}': {error}"),
                        field,
                    )
                })?;
                sprite = Some(key);
            }
            "color" => {
                let value = ctx.required_text(field, field_name)?;
                def.color = parse_hex_color(&value).ok_or_else(|| {
                    ctx.error_at(
                        ContentErrorCode::InvalidValue,
                        format!("color '{value}' must look like #rrggbb"),
                        field,
                    )
                })?;
            }
            "size" => def.size = ctx.parse_finite(field, field_name, true)?,
            "moveSpeed" => def.move_speed = ctx.parse_finite(field, field_name, false)?,
            "health" => def.health = Some(ctx.parse_positive_u32(field, field_name)?),
            "damage" => def.damage = Some(ctx.parse_number::<u32>(field, field_name)?),
            "capacity" => def.capacity = Some(ctx.parse_number::<u32>(field, field_name)?),
            "cost" => def.cost = Some(ctx.parse_number::<u32>(field, field_name)?),
            "attackRange" => def.attack_range = Some(ctx.parse_finite(field, field_name, true)?),
            "attackCooldownTicks" => {
                def.attack_cooldown_ticks = Some(ctx.parse_positive_u32(field, field_name)?)
            }
            "foodValue" => def.food_value = Some(ctx.parse_positive_u32(field, field_name)?),
            "tags" => {
                for tag in field.children().filter(|child| child.is_element()) {
                    if tag.tag_name().name() != "li" {
                        return Err(ctx.error_at(
                            ContentErrorCode::UnknownField,
                            format!("<tags> may only contain <li>, found <{}>", tag.tag_name().name()),
                            tag,
                        ));
                    }
                    def.tags.push(ctx.required_text(tag, "li")?);
                }
            }
            _ => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <EntityDef>"),
                    field,
                ))
            }
        }
    }

    let missing = |name: &str| {
        ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <{name}> in <EntityDef>"),
            node,
        )
    };
    def.def_name = def_name.ok_or_else(|| missing("defName"))?;
    def.label = label.ok_or_else(|| missing("label"))?;
    let Some((renderable, renderable_node)) = renderable else {
        return Err(missing("renderable"));
    };
    def.renderable = match (renderable.as_str(), sprite) {
        ("Placeholder", _) => RenderableKind::Placeholder,
        ("Disc", _) => RenderableKind::Disc,
        ("Sprite", Some(key)) => RenderableKind::Sprite(key),
        ("Sprite", None) => match sprite_key_for_def_name(&def.def_name) {
            Some(key) => RenderableKind::Sprite(key),
            None => {
                return Err(ctx.error_at(
                    ContentErrorCode::MissingField,
                    format!(
                        "renderable Sprite requires a <sprite> key; defName '{}' does not map to one",
                        def.def_name
                    ),
                    renderable_node,
                ))
            }
        },
        (other, _) => {
            return Err(ctx.error_at(
                ContentErrorCode::InvalidValue,
                format!("invalid renderable '{other}'; allowed values: Placeholder, Disc, Sprite"),
                renderable_node,
            ))
        }
    };
    Ok(def)
}

fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

fn map_discovery_error(error: ContentPlanError, root: &Path) -> ContentCompileError {
    match error {
        ContentPlanError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
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

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup_app_paths(root: &Path) -> AppPaths {
        let app = AppPaths::under_root(root);
        fs::create_dir_all(&app.base_content_dir).expect("base");
        fs::create_dir_all(&app.mods_dir).expect("mods");
        app
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn compile_base(xml: &str) -> Result<DefDatabase, ContentCompileError> {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(&app.base_content_dir.join("defs.xml"), xml);
        compile_def_database(&app, &ContentPlanRequest::default())
    }

    #[test]
    fn valid_compile_assigns_stable_ids_by_def_name() {
        let db = compile_base(
            r#"<Defs>
                <EntityDef><defName>zeta</defName><label>Zeta</label><renderable>Disc</renderable></EntityDef>
                <EntityDef><defName>alpha</defName><label>Alpha</label><renderable>Disc</renderable></EntityDef>
            </Defs>"#,
        )
        .expect("compile");
        let alpha = db.entity_def_id_by_name("alpha").expect("alpha");
        let zeta = db.entity_def_id_by_name("zeta").expect("zeta");
        assert!(alpha.0 < zeta.0);
    }

    #[test]
    fn colony_stats_and_tags_are_parsed() {
        let db = compile_base(
            r##"<Defs><EntityDef>
                <defName>ants.fire</defName><label>Fire Ant</label><renderable>Disc</renderable>
                <color>#d04020</color><size>0.45</size><moveSpeed>3</moveSpeed>
                <health>35</health><damage>6</damage><capacity>1</capacity><cost>250</cost>
                <attackRange>1.1</attackRange><attackCooldownTicks>30</attackCooldownTicks>
                <tags><li>forager</li><li>fighter</li></tags>
            </EntityDef></Defs>"##,
        )
        .expect("compile");
        let def = db.entity_def_by_name("ants.fire").expect("def");
        assert_eq!(def.color, [0xd0, 0x40, 0x20]);
        assert_eq!(def.health, Some(35));
        assert_eq!(def.damage, Some(6));
        assert_eq!(def.capacity, Some(1));
        assert_eq!(def.cost, Some(250));
        assert_eq!(def.attack_cooldown_ticks, Some(30));
        assert_eq!(def.food_value, None);
        assert!(def.has_tag("fighter"));
        assert!((def.size - 0.45).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_def_name_reports_mod_file_and_location() {
        let err = compile_base(
            r#"<Defs><EntityDef><label>X</label><renderable>Disc</renderable></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.mod_id, "base");
        assert!(err
            .file_path
            .ends_with(Path::new("assets").join("base").join("defs.xml")));
        assert!(err.location.is_some());
    }

    #[test]
    fn unknown_and_duplicate_fields_error() {
        let err = compile_base(
            r#"<Defs><EntityDef><defName>a</defName><label>A</label><renderable>Disc</renderable><mood>Happy</mood></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);

        let err = compile_base(
            r#"<Defs><EntityDef><defName>a</defName><label>A</label><label>B</label><renderable>Disc</renderable></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateField);
    }

    #[test]
    fn sprite_renderable_uses_def_name_key_unless_given_one() {
        let db = compile_base(
            r#"<Defs><EntityDef><defName>food.cake</defName><label>Cake</label><renderable>Sprite</renderable></EntityDef></Defs>"#,
        )
        .expect("compile");
        let def = db.entity_def_by_name("food.cake").expect("def");
        assert_eq!(def.renderable, RenderableKind::Sprite("food/cake".to_string()));

        let err = compile_base(
            r#"<Defs><EntityDef><defName>Food.Cake</defName><label>Cake</label><renderable>Sprite</renderable></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);

        let err = compile_base(
            r#"<Defs><EntityDef><defName>a</defName><label>A</label><renderable>Sprite</renderable><sprite>../x</sprite></EntityDef></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);

        let db = compile_base(
            r#"<Defs><EntityDef><defName>a</defName><label>A</label><renderable>Sprite</renderable><sprite>ants/queen</sprite></EntityDef></Defs>"#,
        )
        .expect("compile");
        let def = db.entity_def_by_name("a").expect("def");
        assert_eq!(def.renderable, RenderableKind::Sprite("ants/queen".to_string()));
    }

    #[test]
    fn invalid_values_error() {
        for field in [
            "<renderable>Cube</renderable>",
            "<renderable>Disc</renderable><health>0</health>",
            "<renderable>Disc</renderable><moveSpeed>-1</moveSpeed>",
            "<renderable>Disc</renderable><size>NaN</size>",
            "<renderable>Disc</renderable><color>red</color>",
            "<renderable>Disc</renderable><cost>lots</cost>",
        ] {
            let xml = format!(
                "<Defs><EntityDef><defName>a</defName><label>A</label>{field}</EntityDef></Defs>"
            );
            let err = compile_base(&xml).expect_err(field);
            assert_eq!(err.code, ContentErrorCode::InvalidValue, "{field}");
        }
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = compile_base(r#"<Defs><EntityDef><defName>a</defName></Defs>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn wrong_root_and_def_type_error() {
        let err = compile_base(r#"<Things/>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidRoot);

        let err = compile_base(r#"<Defs><ItemDef/></Defs>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownDefType);
    }

    #[test]
    fn same_mod_duplicate_def_errors() {
        let err = compile_base(
            r#"<Defs>
                <EntityDef><defName>a</defName><label>A</label><renderable>Disc</renderable></EntityDef>
                <EntityDef><defName>a</defName><label>B</label><renderable>Disc</renderable></EntityDef>
            </Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateDefInMod);
    }

    #[test]
    fn cross_mod_duplicate_is_last_mod_wins() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("defs.xml"),
            r#"<Defs><EntityDef><defName>ants.worker</defName><label>Base</label><renderable>Disc</renderable><moveSpeed>1.0</moveSpeed></EntityDef></Defs>"#,
        );
        write_file(
            &app.mods_dir.join("fast").join("defs.xml"),
            r#"<Defs><EntityDef><defName>ants.worker</defName><label>Mod</label><renderable>Disc</renderable><moveSpeed>7.0</moveSpeed></EntityDef></Defs>"#,
        );
        let db = compile_def_database(
            &app,
            &ContentPlanRequest {
                enabled_mods: vec!["fast".to_string()],
                ..ContentPlanRequest::default()
            },
        )
        .expect("compile");
        let def = db.entity_def_by_name("ants.worker").expect("def");
        assert_eq!(def.label, "Mod");
        assert!((def.move_speed - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_enabled_mod_is_a_discovery_error() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        let err = compile_def_database(
            &app,
            &ContentPlanRequest {
                enabled_mods: vec!["ghost".to_string()],
                ..ContentPlanRequest::default()
            },
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::Discovery);
        assert_eq!(err.mod_id, "ghost");
    }

    #[test]
    fn defaults_apply_when_optional_fields_are_absent() {
        let db = compile_base(
            r#"<Defs><EntityDef><defName>a</defName><label>A</label><renderable>Placeholder</renderable></EntityDef></Defs>"#,
        )
        .expect("compile");
        let def = db.entity_def_by_name("a").expect("def");
        assert!((def.move_speed - DEFAULT_MOVE_SPEED).abs() < f32::EPSILON);
        assert_eq!(def.color, DEFAULT_COLOR);
        assert_eq!(def.health, None);
        assert!(def.tags.is_empty());
    }

    #[test]
    fn display_includes_location_when_known() {
        let err = ContentCompileError {
            code: ContentErrorCode::InvalidValue,
            message: "bad".to_string(),
            mod_id: "base".to_string(),
            file_path: PathBuf::from("defs.xml"),
            location: Some(SourceLocation { line: 3, column: 9 }),
        };
        assert_eq!(
            err.to_string(),
            "InvalidValue: bad (mod=base, file=defs.xml, line=3, column=9)"
        );
    }
}
