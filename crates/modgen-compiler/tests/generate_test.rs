use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use modgen_compiler::{Generator, ModgenConfig, ModgenError, SchemaDocument};
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/objects_and_components.json")
}

fn fixture_text() -> String {
    std::fs::read_to_string(fixture_path()).unwrap()
}

fn fixture() -> SchemaDocument {
    SchemaDocument::from_json(&fixture_text(), "fixture").unwrap()
}

fn config(dir: &Path, permissive: bool) -> ModgenConfig {
    let text = format!(
        r#"
[schema]
source = "{schema}"
permissive_results = {permissive}

[aliases]
js = "javascript"

[targets.javascript]
index_file = "js/ObjectIndex.js"

[targets.javascript.output_dirs]
objects = "js/objects"
components = "js/components"
results = "js/results"

[targets.javascript.partial_dirs]
objects = "partials/js/objects"
components = "partials/js/components"

[targets.csharp]
index_file = "cs/ObjectIndex.cs"

[targets.csharp.output_dirs]
objects = "cs/objects"
components = "cs/components"
results = "cs/results"

[targets.actionscript2]
index_file = "as2/objects/ObjectIndex.as"

[targets.actionscript2.output_dirs]
objects = "as2/objects"
components = "as2/components"
results = "as2/results"
"#,
        schema = fixture_path().display().to_string().replace('\\', "/"),
        permissive = permissive,
    );
    let path = dir.join("modgen.toml");
    std::fs::write(&path, text).unwrap();
    ModgenConfig::load(&path).unwrap()
}

/// Every generated file under `root`, keyed by relative path.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name() != "modgen.toml")
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn read(root: &Path, relative: &str) -> String {
    std::fs::read_to_string(root.join(relative)).unwrap()
}

#[test]
fn user_object_is_generated_for_every_target() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));
    let report = generator.generate_cached(&[]).unwrap();
    assert_eq!(report.targets.len(), 3);

    let js = read(dir.path(), "js/objects/User.js");
    assert!(js.contains("export class NewgroundsIO_objects_User extends BaseObject {"));
    assert!(js.contains("this.__properties = this.__properties.concat([\"id\", \"name\", \"icons\", \"supporter\"]);"));
    assert!(js.contains("this.__required = [\"id\"];"));
    assert!(js.contains("constructor(props) {"));
    assert!(js.contains("console.warn('Type Mismatch: User.id expects an integer, got a float');"));

    let cs = read(dir.path(), "cs/objects/User.cs");
    assert!(cs.contains("\t\tpublic int? id\n"));
    assert!(cs.contains("\t\tpublic string name\n"));
    assert!(cs.contains("TypeMismatch(\"User.id\", \"an integer\", value);"));

    let as2 = read(dir.path(), "as2/objects/User.as");
    assert!(as2.contains("\tprivate var ___id:Number;\n"));
    assert!(as2.contains("throw new Error('Type Mismatch: User.id expects a number, got ' + typeof(_id));"));
}

#[test]
fn get_scores_result_is_indexed_by_lower_cased_name() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&[]).unwrap();

    let result = read(dir.path(), "js/results/ScoreBoard/getScores.js");
    assert!(result.contains("export class NewgroundsIO_results_ScoreBoard_getScores extends BaseResult {"));
    assert!(result.contains("get scores() {"));
    assert!(result.contains("_scores[i0]"));
    assert!(!result.contains("scoresIsList"));

    assert!(read(dir.path(), "js/ObjectIndex.js").contains("\"scoreboard.getscores\": NewgroundsIO_results_ScoreBoard_getScores,"));
    assert!(read(dir.path(), "cs/ObjectIndex.cs").contains("{ \"scoreboard.getscores\", () => new NewgroundsIO.results.ScoreBoard.getScores() },"));
    assert!(read(dir.path(), "as2/objects/ObjectIndex.as").contains("results[\"scoreboard.getscores\"] = io.newgrounds.models.results.ScoreBoard.getScores;"));
}

#[test]
fn generation_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));

    generator.generate_cached(&[]).unwrap();
    let first = snapshot(dir.path());
    generator.generate_cached(&[]).unwrap();
    let second = snapshot(dir.path());

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn description_change_touches_only_its_entity() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));

    let changed_text = fixture_text().replace("The user's textual name.", "The user's display name.");
    let changed = SchemaDocument::from_json(&changed_text, "changed").unwrap();

    for target in ["javascript", "csharp", "actionscript2"] {
        let before = generator.render(&fixture(), target).unwrap();
        let after = generator.render(&changed, target).unwrap();
        assert_eq!(before.files.len(), after.files.len());

        let differing: Vec<_> = before
            .files
            .iter()
            .zip(&after.files)
            .filter(|(a, b)| a.contents != b.contents)
            .map(|(a, _)| a.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(differing.len(), 1, "{target}: {differing:?}");
        assert!(differing[0].starts_with("User."), "{target}: {differing:?}");
    }
}

#[test]
fn every_method_gets_a_result_in_permissive_mode() {
    let dir = TempDir::new().unwrap();
    let report = Generator::new(config(dir.path(), true)).generate_cached(&["js".to_string()]).unwrap();
    assert_eq!(report.targets[0].components, 3);
    assert_eq!(report.targets[0].results, 3);

    let check_session = read(dir.path(), "js/results/App/checkSession.js");
    assert!(check_session.contains("this.__properties = this.__properties.concat([]);"));

    let strict_dir = TempDir::new().unwrap();
    let report = Generator::new(config(strict_dir.path(), false)).generate_cached(&["js".to_string()]).unwrap();
    assert_eq!(report.targets[0].results, 2);
    assert!(!strict_dir.path().join("js/results/App/checkSession.js").exists());
}

#[test]
fn sentinels_are_never_generated() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&[]).unwrap();

    for path in snapshot(dir.path()).keys() {
        let text = path.to_string_lossy();
        assert!(!text.contains("Result."), "generated {text}");
        assert!(!text.contains("Execute"), "generated {text}");
    }

    let index = read(dir.path(), "js/ObjectIndex.js");
    assert!(!index.contains("\"result\""));
    assert!(!index.contains("\"execute"));
}

#[test]
fn polymorphic_result_defers_to_the_index() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&[]).unwrap();

    let js = read(dir.path(), "js/objects/Response.js");
    assert!(js.contains("import { ObjectIndex } from '../ObjectIndex.js';"));
    assert!(js.contains("get resultList() {"));
    assert!(js.contains("get resultIsList() {"));
    assert!(js.contains("ObjectIndex.createResult(_result.component, _result.data)"));

    let cs = read(dir.path(), "cs/objects/Response.cs");
    assert!(cs.contains("public List<NewgroundsIO.BaseResult> resultList"));
    assert!(cs.contains("NewgroundsIO.ObjectIndex.CreateResult("));
}

#[test]
fn required_fields_propagate_to_components() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&[]).unwrap();

    let js = read(dir.path(), "js/components/ScoreBoard/getScores.js");
    assert!(js.contains("this.__required = [\"id\"];"));
    assert!(js.contains("this._period = \"D\";"));
    assert!(js.contains("this._limit = 10;"));

    let cs = read(dir.path(), "cs/components/Medal/unlock.cs");
    assert!(cs.contains("__required = new List<string> { \"id\" };"));
    assert!(cs.contains("__isSecure = true;"));
}

#[test]
fn partials_are_spliced_into_their_entity() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path(), true);

    let partials = dir.path().join("partials/js/components");
    std::fs::create_dir_all(&partials).unwrap();
    std::fs::write(partials.join("Medal.unlock.class.js"), "\tunlockLocally() {\n\t\treturn true;\n\t}\n").unwrap();
    std::fs::write(partials.join("Medal.unlock.import.js"), "import { cache } from '../../cache.js';\n").unwrap();

    Generator::new(config).generate_cached(&["javascript".to_string()]).unwrap();

    let unlock = read(dir.path(), "js/components/Medal/unlock.js");
    assert!(unlock.contains("import { cache } from '../../cache.js';\n"));
    assert!(unlock.ends_with("\tunlockLocally() {\n\t\treturn true;\n\t}\n}\n"));
    assert!(!read(dir.path(), "js/results/Medal/unlock.js").contains("unlockLocally"));
}

#[test]
fn invalid_identifier_names_the_entity() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));
    let doc = SchemaDocument::from_json(
        r#"{"objects":{"Bad":{"properties":{"user-id":{"type":"int"}}}},"components":{}}"#,
        "test",
    )
    .unwrap();

    let err = generator.generate_with_document(&doc, &[]).unwrap_err();
    assert!(matches!(err, ModgenError::Render { ref entity, .. } if entity == "Bad"));
}

#[test]
fn unknown_target_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Generator::new(config(dir.path(), true)).generate_cached(&["swift".to_string()]).unwrap_err();
    assert!(matches!(err, ModgenError::UnknownTarget { .. }));
    assert!(snapshot(dir.path()).is_empty());
}

#[tokio::test]
async fn local_schema_loads_without_cache() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));

    let report = generator.generate(&["cs".to_string(), "as2".to_string()]).await;
    // No alias for these two in the test config.
    assert!(matches!(report, Err(ModgenError::UnknownTarget { .. })));

    let report = generator.generate(&["csharp".to_string()]).await.unwrap();
    assert_eq!(report.targets[0].language, "C#");
    assert!(report.files_written() > 0);
    assert!(!dir.path().join(".modgen").exists());
}

/// The body of the accessor starting with `header`, up to its closing brace.
fn accessor_body<'a>(source: &'a str, header: &str) -> &'a str {
    let start = source.find(header).unwrap_or_else(|| panic!("no accessor {header}"));
    let body = &source[start + header.len()..];
    &body[..body.find("\n\t}\n").unwrap()]
}

#[test]
fn polymorphic_setters_clear_the_other_form() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&[]).unwrap();

    let js = read(dir.path(), "js/objects/Response.js");
    let single = accessor_body(&js, "\tset result(_result) {\n");
    assert!(single.ends_with("\t\tthis._resultList = null;\n\t\tthis._resultIsList = false;"), "{single}");
    let list = accessor_body(&js, "\tset resultList(_resultList) {\n");
    assert!(list.ends_with("\t\tthis._result = null;\n\t\tthis._resultIsList = true;"), "{list}");

    let as2 = read(dir.path(), "as2/objects/Response.as");
    let single = accessor_body(&as2, "\tpublic function set result(_result):Void {\n");
    assert!(single.ends_with("\t\tthis.___resultList = null;\n\t\tthis.___resultIsList = false;"), "{single}");
    let list = accessor_body(&as2, "\tpublic function set resultList(_resultList):Void {\n");
    assert!(list.ends_with("\t\tthis.___result = null;\n\t\tthis.___resultIsList = true;"), "{list}");

    let cs = read(dir.path(), "cs/objects/Response.cs");
    assert!(cs.contains("\t\t\t\t_resultList = value;\n\t\t\t\t_result = null;\n\t\t\t\t_resultIsList = value != null;\n"));
    assert!(cs.contains("\t\t\t\t\t\t_result = null;\n\t\t\t\t\t\t_resultIsList = true;\n\t\t\t\t\t\tbreak;\n"));
    assert!(cs.contains("\t\t\t\t\t_resultList = null;\n\t\t\t\t\t_resultIsList = false;\n\t\t\t\t\tbreak;\n"));
}

#[test]
fn javascript_index_defers_class_lookups() {
    let dir = TempDir::new().unwrap();
    Generator::new(config(dir.path(), true)).generate_cached(&["javascript".to_string()]).unwrap();

    let index = read(dir.path(), "js/ObjectIndex.js");
    for line in index.lines() {
        if line.starts_with("import ") || line.starts_with('\t') {
            continue;
        }
        assert!(!line.contains("NewgroundsIO_"), "top-level class use: {line}");
    }
}

#[test]
fn scaffold_writes_base_classes_next_to_generated_code() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));
    generator.generate_cached(&[]).unwrap();

    let scaffolded = generator.scaffold(&[], false).unwrap();
    assert_eq!(scaffolded.len(), 3);

    let user = read(dir.path(), "js/objects/User.js");
    assert!(user.contains("import { BaseObject } from '../runtime.js';"));
    assert!(read(dir.path(), "js/runtime.js").contains("export class BaseObject {"));

    let base = read(dir.path(), "cs/BaseObject.cs");
    assert!(base.contains("namespace NewgroundsIO\n{"));
    assert!(base.contains("protected virtual void TypeMismatch(string label, string expected, object value)"));
    assert!(dir.path().join("cs/BaseComponent.cs").exists());
    assert!(dir.path().join("cs/BaseResult.cs").exists());

    let component = read(dir.path(), "as2/BaseComponent.as");
    assert!(component.contains("class io.newgrounds.models.BaseComponent extends io.newgrounds.models.BaseObject {"));
}

#[test]
fn scaffold_keeps_edited_base_classes_without_force() {
    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));
    generator.scaffold(&["js".to_string()], false).unwrap();

    let runtime = dir.path().join("js/runtime.js");
    std::fs::write(&runtime, "// edited\n").unwrap();

    let err = generator.scaffold(&[], false).unwrap_err();
    assert!(matches!(err, ModgenError::ScaffoldExists { ref path } if path == &runtime));
    assert_eq!(read(dir.path(), "js/runtime.js"), "// edited\n");
    assert!(!dir.path().join("cs/BaseObject.cs").exists());

    generator.scaffold(&[], true).unwrap();
    assert!(read(dir.path(), "js/runtime.js").contains("export class BaseComponent extends BaseObject {"));
}

/// Loads an entity module before the index, the order that used to hit the
/// index's bindings before they were initialised.
#[test]
fn generated_javascript_loads_entity_first_in_node() {
    let node_available = std::process::Command::new("node")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !node_available {
        eprintln!("node not found, skipping");
        return;
    }

    let dir = TempDir::new().unwrap();
    let generator = Generator::new(config(dir.path(), true));
    generator.generate_cached(&["javascript".to_string()]).unwrap();
    generator.scaffold(&["javascript".to_string()], false).unwrap();

    std::fs::write(dir.path().join("package.json"), "{\"type\": \"module\"}\n").unwrap();
    std::fs::write(
        dir.path().join("check.mjs"),
        r#"import { NewgroundsIO_objects_Response } from './js/objects/Response.js';

const response = new NewgroundsIO_objects_Response({
	success: true,
	result: { component: 'ScoreBoard.getScores', data: { scores: [] } },
});
if (response.resultIsList || response.result === null) throw new Error('single result not decoded');
if (response.result.objectName !== 'ScoreBoard.getScores') throw new Error('wrong result: ' + response.result.objectName);

response.result = [{ component: 'Medal.unlock', data: {} }];
if (!response.resultIsList || response.resultList.length !== 1) throw new Error('list result not decoded');
console.log('ok');
"#,
    )
    .unwrap();

    let output = std::process::Command::new("node")
        .arg("check.mjs")
        .current_dir(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}
