//! ES module back-end.
//!
//! Each entity becomes an exported class extending one of the hand-written
//! `BaseObject`, `BaseComponent` or `BaseResult` classes from the runtime
//! module. Imports are explicit; nothing is attached to a global namespace.

use std::path::PathBuf;

use super::ecma::{Caster, Dialect};
use super::naming::{self, quote, quote_list, BANNER};
use super::{runtime, EntityIndex, IndexEntry, Layout, PartialHooks, RenderOptions, RenderedFile, Renderer};
use crate::diagnostic::ModgenError;
use crate::ir::{Entity, EntityKind, Primitive, Property, TypeSystem};

pub struct JavaScriptRenderer {
    layout: Layout,
    options: RenderOptions,
}

/// JSDoc type expressions.
struct JsTypes<'a> {
    options: &'a RenderOptions,
}

impl TypeSystem for JsTypes<'_> {
    fn primitive(&self, primitive: Primitive) -> String {
        match primitive {
            Primitive::Int | Primitive::Float => "number",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
            Primitive::Object => "object",
            Primitive::Array => "Array",
            Primitive::Mixed => "*",
        }
        .to_string()
    }

    fn object(&self, name: &str) -> String {
        format!("{}_objects_{}", self.options.namespace, self.options.class_name(name))
    }

    fn result_base(&self) -> String {
        "BaseResult".to_string()
    }

    fn unknown(&self) -> String {
        "*".to_string()
    }

    fn list(&self, element: &str) -> String {
        format!("Array.<{}>", element)
    }

    fn either(&self, single: &str, list: &str) -> String {
        format!("({}|{})", single, list)
    }
}

impl JavaScriptRenderer {
    pub fn new(layout: Layout, options: RenderOptions) -> Self {
        Self { layout, options }
    }

    fn types(&self) -> JsTypes<'_> {
        JsTypes { options: &self.options }
    }

    fn class_name(&self, entity: &Entity) -> String {
        let ns = &self.options.namespace;
        match (entity.kind, &entity.namespace, &entity.method) {
            (EntityKind::Component, Some(component), Some(method)) => format!("{}_components_{}_{}", ns, component, method),
            (EntityKind::Result, Some(component), Some(method)) => format!("{}_results_{}_{}", ns, component, method),
            _ => self.types().object(&entity.name),
        }
    }

    fn base_class(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Object => "BaseObject",
            EntityKind::Component => "BaseComponent",
            EntityKind::Result => "BaseResult",
        }
    }

    fn runtime_module(&self) -> PathBuf {
        self.layout
            .runtime_module
            .clone()
            .unwrap_or_else(|| self.layout.base_dir().join(format!("runtime{}", self.layout.file_extension)))
    }

    fn object_file(&self, name: &str) -> PathBuf {
        self.layout
            .objects_dir
            .join(format!("{}{}", self.options.class_name(name), self.layout.file_extension))
    }

    fn render_entity(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        let types = self.types();
        let path = self.layout.file_for(entity, self.options.class_name(&entity.name));
        let class_name = self.class_name(entity);
        let base = Self::base_class(entity.kind);

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");

        // Imports
        let mut runtime_names = vec![base];
        if entity.uses_result_lookup() && base != "BaseResult" {
            runtime_names.push("BaseResult");
        }
        out.push_str(&format!(
            "import {{ {} }} from '{}';\n",
            runtime_names.join(", "),
            naming::module_specifier(&path, &self.runtime_module())
        ));

        if entity.uses_result_lookup() {
            let index_file = self.layout.index_file.as_ref().ok_or_else(|| {
                ModgenError::render(&entity.name, "a property refers to Result but no index_file is configured")
            })?;
            out.push_str(&format!(
                "import {{ ObjectIndex }} from '{}';\n",
                naming::module_specifier(&path, index_file)
            ));
        }

        for name in entity.referenced_objects() {
            if entity.kind == EntityKind::Object && name == entity.name {
                continue;
            }
            out.push_str(&format!(
                "import {{ {} }} from '{}';\n",
                types.object(name),
                naming::module_specifier(&path, &self.object_file(name))
            ));
        }
        naming::push_partial(&mut out, hooks.import.as_ref());
        out.push('\n');

        // Class header
        let summary = match entity.kind {
            EntityKind::Object => None,
            EntityKind::Component => Some(format!("Used to call the {} component.", entity.name)),
            EntityKind::Result => Some(format!("Returned when the {} component is called.", entity.name)),
        };
        let mut doc: Vec<String> = summary.into_iter().collect();
        if let Some(description) = &entity.description {
            doc.extend(naming::description_lines(description, |n| types.object(n)));
        }
        if !doc.is_empty() {
            out.push_str("/**\n");
            for line in &doc {
                out.push_str(&format!(" * {}\n", line));
            }
            out.push_str(" */\n");
        }
        out.push_str(&format!("export class {} extends {} {{\n", class_name, base));
        if let Some(properties) = &hooks.properties {
            out.push('\n');
            naming::push_partial(&mut out, Some(properties));
        }

        // Constructor
        out.push('\n');
        out.push_str("\t/**\n");
        out.push_str("\t * @param {object} [props] Initial property values.\n");
        out.push_str("\t */\n");
        out.push_str("\tconstructor(props) {\n");
        out.push_str("\t\tsuper();\n");
        out.push_str(&format!("\t\tthis.__object = {};\n", quote(&entity.name)));
        for prop in &entity.properties {
            out.push_str(&format!(
                "\t\tthis._{} = {};\n",
                prop.name,
                naming::ecma_literal(prop.default_value())
            ));
            if prop.is_polymorphic() {
                out.push_str(&format!("\t\tthis._{}List = null;\n", prop.name));
                out.push_str(&format!("\t\tthis._{}IsList = false;\n", prop.name));
            }
        }
        out.push_str(&format!(
            "\t\tthis.__properties = this.__properties.concat([{}]);\n",
            quote_list(entity.properties.iter().map(|p| p.name.as_str()))
        ));
        out.push_str(&format!(
            "\t\tthis.__required = [{}];\n",
            quote_list(entity.required.iter().map(String::as_str))
        ));
        if entity.kind == EntityKind::Component {
            out.push_str(&format!("\t\tthis.__isSecure = {};\n", entity.flags.secure));
            out.push_str(&format!("\t\tthis.__requireSession = {};\n", entity.flags.require_session));
            out.push_str(&format!("\t\tthis.__isRedirect = {};\n", entity.flags.redirect));
        }
        out.push_str("\t\tif (props !== null && typeof(props) === 'object') {\n");
        out.push_str("\t\t\tfor (var i = 0; i < this.__properties.length; i++) {\n");
        out.push_str("\t\t\t\tvar name = this.__properties[i];\n");
        out.push_str("\t\t\t\tif (typeof(props[name]) !== 'undefined') this[name] = props[name];\n");
        out.push_str("\t\t\t}\n");
        out.push_str("\t\t}\n");
        naming::push_partial(&mut out, hooks.constructor.as_ref());
        out.push_str("\t}\n");

        // Accessors
        let caster = Caster {
            dialect: Dialect::JavaScript,
            types: &types,
            index: "ObjectIndex".to_string(),
        };
        for prop in &entity.properties {
            out.push('\n');
            self.render_accessors(&mut out, entity, prop, &caster);
        }

        if let Some(class) = &hooks.class {
            out.push('\n');
            naming::push_partial(&mut out, Some(class));
        }
        out.push_str("}\n");

        Ok(RenderedFile { path, contents: out })
    }

    fn render_accessors(&self, out: &mut String, entity: &Entity, prop: &Property, caster: &Caster<'_>) {
        let types = self.types();
        let name = &prop.name;
        let label = format!("{}.{}", entity.name, name);

        out.push_str("\t/**\n");
        if let Some(description) = &prop.description {
            for line in naming::description_lines(description, |n| types.object(n)) {
                out.push_str(&format!("\t * {}\n", line));
            }
        }
        if entity.is_required(name) {
            out.push_str("\t * Required.\n");
        }
        out.push_str(&format!("\t * @type {{{}}}\n", prop.native_type(&types)));
        out.push_str("\t */\n");

        if !prop.is_polymorphic() {
            out.push_str(&format!("\tget {}() {{\n", name));
            out.push_str(&format!("\t\treturn this._{};\n", name));
            out.push_str("\t}\n\n");
            out.push_str(&format!("\tset {}(_{}) {{\n", name, name));
            push_null_guard(out, &[format!("this._{} = null;", name)], name);
            let value = format!("_{}", name);
            if prop.requires_runtime_check() {
                caster.cast(out, &prop.shape, &value, &format!("this._{}", name), &label, 2, 0);
            } else {
                out.push_str(&format!("\t\tthis._{} = {};\n", name, value));
            }
            out.push_str("\t}\n");
            return;
        }

        // Polymorphic: a bare value or a list, never both at once.
        let Some(single) = prop.shape.single() else { return };
        let Some(element) = prop.shape.element() else { return };
        let cleared = [
            format!("this._{} = null;", name),
            format!("this._{}List = null;", name),
            format!("this._{}IsList = false;", name),
        ];

        out.push_str(&format!("\tget {}() {{\n", name));
        out.push_str(&format!("\t\treturn this._{n}IsList ? this._{n}List : this._{n};\n", n = name));
        out.push_str("\t}\n\n");
        out.push_str(&format!("\tset {}(_{}) {{\n", name, name));
        push_null_guard(out, &cleared, name);
        out.push_str(&format!("\t\tif (Array.isArray(_{})) {{\n", name));
        out.push_str(&format!("\t\t\tthis.{n}List = _{n};\n", n = name));
        out.push_str("\t\t\treturn;\n");
        out.push_str("\t\t}\n");
        caster.cast(
            out,
            &crate::ir::Shape::Single(single.clone()),
            &format!("_{}", name),
            &format!("this._{}", name),
            &label,
            2,
            0,
        );
        out.push_str(&format!("\t\tthis._{}List = null;\n", name));
        out.push_str(&format!("\t\tthis._{}IsList = false;\n", name));
        out.push_str("\t}\n\n");

        out.push_str("\t/**\n");
        out.push_str(&format!("\t * The list form of `{}`.\n", name));
        out.push_str(&format!("\t * @type {{{}}}\n", types.list(&element.native_type(&types))));
        out.push_str("\t */\n");
        out.push_str(&format!("\tget {}List() {{\n", name));
        out.push_str(&format!("\t\treturn this._{}List;\n", name));
        out.push_str("\t}\n\n");
        out.push_str(&format!("\tset {}List(_{}List) {{\n", name, name));
        push_null_guard(out, &cleared, &format!("{}List", name));
        caster.cast(
            out,
            &crate::ir::Shape::List(Box::new(element.clone())),
            &format!("_{}List", name),
            &format!("this._{}List", name),
            &label,
            2,
            0,
        );
        out.push_str(&format!("\t\tthis._{} = null;\n", name));
        out.push_str(&format!("\t\tthis._{}IsList = true;\n", name));
        out.push_str("\t}\n\n");

        out.push_str("\t/**\n");
        out.push_str(&format!("\t * True when `{}` currently holds a list.\n", name));
        out.push_str("\t * @type {boolean}\n");
        out.push_str("\t */\n");
        out.push_str(&format!("\tget {}IsList() {{\n", name));
        out.push_str(&format!("\t\treturn this._{}IsList;\n", name));
        out.push_str("\t}\n");
    }

    fn render_table(&self, out: &mut String, name: &str, entries: &[IndexEntry<'_>]) {
        out.push_str(&format!("\t\t\t{}: {{\n", name));
        for entry in entries {
            out.push_str(&format!("\t\t\t\t{}: {},\n", quote(&entry.key), self.class_name(entry.entity)));
        }
        out.push_str("\t\t\t},\n");
    }
}

fn push_null_guard(out: &mut String, clear: &[String], param: &str) {
    out.push_str(&format!(
        "\t\tif (_{p} === null || typeof(_{p}) === 'undefined') {{\n",
        p = param
    ));
    for statement in clear {
        out.push_str(&format!("\t\t\t{}\n", statement));
    }
    out.push_str("\t\t\treturn;\n");
    out.push_str("\t\t}\n");
}

impl Renderer for JavaScriptRenderer {
    fn language(&self) -> &'static str {
        "JavaScript"
    }

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn render_object(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        self.render_entity(entity, hooks)
    }

    fn render_component(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        self.render_entity(entity, hooks)
    }

    fn render_result(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        self.render_entity(entity, hooks)
    }

    fn render_index(&self, index: &EntityIndex<'_>) -> Result<RenderedFile, ModgenError> {
        let path = self
            .layout
            .index_file
            .clone()
            .ok_or_else(|| ModgenError::render("ObjectIndex", "no index_file configured"))?;

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");

        for entry in index.objects.iter().chain(&index.components).chain(&index.results) {
            let target = self
                .layout
                .file_for(entry.entity, self.options.class_name(&entry.entity.name));
            out.push_str(&format!(
                "import {{ {} }} from '{}';\n",
                self.class_name(entry.entity),
                naming::module_specifier(&path, &target)
            ));
        }
        out.push('\n');

        // Filled on first lookup. Entity modules import this file in turn.
        out.push_str("let tables = null;\n\n");
        out.push_str("function registry() {\n");
        out.push_str("\tif (tables === null) {\n");
        out.push_str("\t\ttables = {\n");
        self.render_table(&mut out, "objects", &index.objects);
        self.render_table(&mut out, "components", &index.components);
        self.render_table(&mut out, "results", &index.results);
        out.push_str("\t\t};\n");
        out.push_str("\t}\n");
        out.push_str("\treturn tables;\n");
        out.push_str("}\n\n");

        out.push_str("function create(table, name, props) {\n");
        out.push_str("\tvar ctor = registry()[table][String(name).toLowerCase()];\n");
        out.push_str("\treturn ctor ? new ctor(props) : null;\n");
        out.push_str("}\n\n");

        out.push_str("/**\n");
        out.push_str(" * Creates generated instances from the names carried in payloads.\n");
        out.push_str(" */\n");
        out.push_str("export const ObjectIndex = {\n");
        out.push_str("\tcreateObject(name, props) {\n\t\treturn create('objects', name, props);\n\t},\n");
        out.push_str("\tcreateComponent(name, props) {\n\t\treturn create('components', name, props);\n\t},\n");
        out.push_str("\tcreateResult(name, props) {\n\t\treturn create('results', name, props);\n\t},\n");
        out.push_str("};\n\n");
        out.push_str("export default ObjectIndex;\n");

        Ok(RenderedFile { path, contents: out })
    }

    fn render_runtime(&self) -> Vec<RenderedFile> {
        vec![RenderedFile {
            path: self.runtime_module(),
            contents: runtime::JAVASCRIPT.to_string(),
        }]
    }
}
