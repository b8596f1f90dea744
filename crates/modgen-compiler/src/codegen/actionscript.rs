//! ActionScript 2 back-end.
//!
//! AS2 has no modules, so every class is addressed by its fully qualified
//! package path and the file layout is expected to mirror the packages.
//! Setters throw on a type mismatch.

use super::ecma::{Caster, Dialect};
use super::naming::{self, quote, quote_list, BANNER};
use super::{runtime, EntityIndex, IndexEntry, Layout, PartialHooks, RenderOptions, RenderedFile, Renderer};
use crate::diagnostic::ModgenError;
use crate::ir::{Entity, EntityKind, Primitive, Property, Shape, TypeSystem};

pub struct ActionScriptRenderer {
    layout: Layout,
    options: RenderOptions,
}

struct As2Types<'a> {
    options: &'a RenderOptions,
}

impl TypeSystem for As2Types<'_> {
    fn primitive(&self, primitive: Primitive) -> String {
        match primitive {
            Primitive::Int | Primitive::Float => "Number",
            Primitive::String => "String",
            Primitive::Boolean => "Boolean",
            Primitive::Object | Primitive::Mixed => "Object",
            Primitive::Array => "Array",
        }
        .to_string()
    }

    fn object(&self, name: &str) -> String {
        format!("{}.objects.{}", self.options.namespace, self.options.class_name(name))
    }

    fn result_base(&self) -> String {
        format!("{}.BaseResult", self.options.namespace)
    }

    fn unknown(&self) -> String {
        "Object".to_string()
    }

    fn list(&self, _element: &str) -> String {
        "Array".to_string()
    }

    // AS2 has no union types; the slot stays untyped.
    fn either(&self, _single: &str, _list: &str) -> String {
        String::new()
    }
}

/// `:Type`, or nothing for untyped slots.
fn annotate(ty: &str) -> String {
    if ty.is_empty() {
        String::new()
    } else {
        format!(":{}", ty)
    }
}

impl ActionScriptRenderer {
    pub fn new(layout: Layout, options: RenderOptions) -> Self {
        Self { layout, options }
    }

    fn types(&self) -> As2Types<'_> {
        As2Types { options: &self.options }
    }

    fn index_class(&self) -> String {
        format!("{}.objects.ObjectIndex", self.options.namespace)
    }

    /// `(qualified class, constructor name)`.
    fn class_name(&self, entity: &Entity) -> (String, String) {
        let ns = &self.options.namespace;
        match (entity.kind, &entity.namespace, &entity.method) {
            (EntityKind::Component, Some(component), Some(method)) => {
                (format!("{}.components.{}.{}", ns, component, method), method.clone())
            }
            (EntityKind::Result, Some(component), Some(method)) => {
                (format!("{}.results.{}.{}", ns, component, method), method.clone())
            }
            _ => {
                let short = self.options.class_name(&entity.name).to_string();
                (self.types().object(&entity.name), short)
            }
        }
    }

    fn base_class(&self, kind: EntityKind) -> String {
        let base = match kind {
            EntityKind::Object => "BaseObject",
            EntityKind::Component => "BaseComponent",
            EntityKind::Result => "BaseResult",
        };
        format!("{}.{}", self.options.namespace, base)
    }

    fn render_entity(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        let types = self.types();
        let path = self.layout.file_for(entity, self.options.class_name(&entity.name));
        let (qualified, short) = self.class_name(entity);

        if entity.uses_result_lookup() && self.layout.index_file.is_none() {
            return Err(ModgenError::render(
                &entity.name,
                "a property refers to Result but no index_file is configured",
            ));
        }

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");

        let mut imports: Vec<String> = entity
            .referenced_objects()
            .into_iter()
            .filter(|name| !(entity.kind == EntityKind::Object && *name == entity.name))
            .map(|name| types.object(name))
            .collect();
        if entity.uses_result_lookup() {
            imports.push(self.index_class());
        }
        for import in &imports {
            out.push_str(&format!("import {};\n", import));
        }
        naming::push_partial(&mut out, hooks.import.as_ref());
        if !imports.is_empty() || hooks.import.is_some() {
            out.push('\n');
        }

        if let Some(description) = &entity.description {
            out.push_str("/**\n");
            for line in naming::description_lines(description, |n| types.object(n)) {
                out.push_str(&format!(" * {}\n", line));
            }
            out.push_str(" */\n");
        }
        out.push_str(&format!("class {} extends {} {{\n", qualified, self.base_class(entity.kind)));

        // Fields
        out.push('\n');
        for prop in &entity.properties {
            let ty = annotate(&prop.native_type(&types));
            match prop.default_value() {
                Some(default) => out.push_str(&format!(
                    "\tprivate var ___{}{} = {};\n",
                    prop.name,
                    ty,
                    naming::ecma_literal(Some(default))
                )),
                None => out.push_str(&format!("\tprivate var ___{}{};\n", prop.name, ty)),
            }
            if prop.is_polymorphic() {
                out.push_str(&format!("\tprivate var ___{}List:Array;\n", prop.name));
                out.push_str(&format!("\tprivate var ___{}IsList:Boolean = false;\n", prop.name));
            }
        }
        naming::push_partial(&mut out, hooks.properties.as_ref());

        // Constructor
        out.push('\n');
        out.push_str("\t/**\n");
        out.push_str("\t * @param props Initial property values.\n");
        out.push_str("\t */\n");
        out.push_str(&format!("\tpublic function {}(props:Object) {{\n", short));
        out.push_str("\t\tsuper();\n");
        out.push_str(&format!("\t\tthis.__object = {};\n", quote(&entity.name)));
        out.push_str(&format!(
            "\t\tthis.__properties = this.__properties.concat([{}]);\n",
            quote_list(entity.properties.iter().map(|p| p.name.as_str()))
        ));
        out.push_str(&format!(
            "\t\tthis.__required = [{}];\n",
            quote_list(entity.required.iter().map(String::as_str))
        ));
        out.push_str(&format!("\t\tthis.__castTypes = {};\n", self.type_table(&entity.object_map)));
        out.push_str(&format!("\t\tthis.__arrayTypes = {};\n", self.type_table(&entity.object_lists)));
        if entity.kind == EntityKind::Component {
            out.push_str(&format!("\t\tthis.__isSecure = {};\n", entity.flags.secure));
            out.push_str(&format!("\t\tthis.__requireSession = {};\n", entity.flags.require_session));
            out.push_str(&format!("\t\tthis.__isRedirect = {};\n", entity.flags.redirect));
        }
        naming::push_partial(&mut out, hooks.constructor.as_ref());
        out.push_str("\t\tthis.fillProperties(props);\n");
        out.push_str("\t}\n");

        let caster = Caster {
            dialect: Dialect::ActionScript2,
            types: &types,
            index: self.index_class(),
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

    fn type_table(&self, pairs: &[(String, String)]) -> String {
        if pairs.is_empty() {
            return "{}".to_string();
        }
        let types = self.types();
        let entries: Vec<String> = pairs
            .iter()
            .map(|(prop, object)| format!("{}: {}", prop, types.object(object)))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    fn render_accessors(&self, out: &mut String, entity: &Entity, prop: &Property, caster: &Caster<'_>) {
        let types = self.types();
        let name = &prop.name;
        let label = format!("{}.{}", entity.name, name);
        let ty = annotate(&prop.native_type(&types));

        let mut doc: Vec<String> = prop
            .description
            .as_deref()
            .map(|d| naming::description_lines(d, |n| types.object(n)))
            .unwrap_or_default();
        if entity.is_required(name) {
            doc.push("Required.".to_string());
        }
        if !doc.is_empty() {
            out.push_str("\t/**\n");
            for line in &doc {
                out.push_str(&format!("\t * {}\n", line));
            }
            out.push_str("\t */\n");
        }

        if !prop.is_polymorphic() {
            out.push_str(&format!("\tpublic function get {}(){} {{\n", name, ty));
            out.push_str(&format!("\t\treturn this.___{};\n", name));
            out.push_str("\t}\n\n");
            out.push_str(&format!("\tpublic function set {}(_{}):Void {{\n", name, name));
            push_null_guard(out, &[format!("this.___{} = null;", name)], name);
            let value = format!("_{}", name);
            if prop.requires_runtime_check() {
                caster.cast(out, &prop.shape, &value, &format!("this.___{}", name), &label, 2, 0);
            } else {
                out.push_str(&format!("\t\tthis.___{} = {};\n", name, value));
            }
            out.push_str("\t}\n");
            return;
        }

        let Some(single) = prop.shape.single() else { return };
        let Some(element) = prop.shape.element() else { return };
        let cleared = [
            format!("this.___{} = null;", name),
            format!("this.___{}List = null;", name),
            format!("this.___{}IsList = false;", name),
        ];

        out.push_str(&format!("\tpublic function get {}() {{\n", name));
        out.push_str(&format!("\t\treturn this.___{n}IsList ? this.___{n}List : this.___{n};\n", n = name));
        out.push_str("\t}\n\n");
        out.push_str(&format!("\tpublic function set {}(_{}):Void {{\n", name, name));
        push_null_guard(out, &cleared, name);
        out.push_str(&format!("\t\tif (_{} instanceof Array) {{\n", name));
        out.push_str(&format!("\t\t\tthis.{n}List = _{n};\n", n = name));
        out.push_str("\t\t\treturn;\n");
        out.push_str("\t\t}\n");
        caster.cast(
            out,
            &Shape::Single(single.clone()),
            &format!("_{}", name),
            &format!("this.___{}", name),
            &label,
            2,
            0,
        );
        out.push_str(&format!("\t\tthis.___{}List = null;\n", name));
        out.push_str(&format!("\t\tthis.___{}IsList = false;\n", name));
        out.push_str("\t}\n\n");

        out.push_str(&format!("\tpublic function get {}List():Array {{\n", name));
        out.push_str(&format!("\t\treturn this.___{}List;\n", name));
        out.push_str("\t}\n\n");
        out.push_str(&format!("\tpublic function set {}List(_{}List):Void {{\n", name, name));
        push_null_guard(out, &cleared, &format!("{}List", name));
        caster.cast(
            out,
            &Shape::List(Box::new(element.clone())),
            &format!("_{}List", name),
            &format!("this.___{}List", name),
            &label,
            2,
            0,
        );
        out.push_str(&format!("\t\tthis.___{} = null;\n", name));
        out.push_str(&format!("\t\tthis.___{}IsList = true;\n", name));
        out.push_str("\t}\n\n");

        out.push_str(&format!("\tpublic function get {}IsList():Boolean {{\n", name));
        out.push_str(&format!("\t\treturn this.___{}IsList;\n", name));
        out.push_str("\t}\n");
    }

    fn render_table(&self, out: &mut String, registry: &str, entries: &[IndexEntry<'_>]) {
        out.push_str(&format!("\t\t{} = {{}};\n", registry));
        for entry in entries {
            out.push_str(&format!(
                "\t\t{}[{}] = {};\n",
                registry,
                quote(&entry.key),
                self.class_name(entry.entity).0
            ));
        }
    }
}

fn push_null_guard(out: &mut String, clear: &[String], param: &str) {
    out.push_str(&format!(
        "\t\tif (_{p} === null || _{p} === undefined) {{\n",
        p = param
    ));
    for statement in clear {
        out.push_str(&format!("\t\t\t{}\n", statement));
    }
    out.push_str("\t\t\treturn;\n");
    out.push_str("\t\t}\n");
}

impl Renderer for ActionScriptRenderer {
    fn language(&self) -> &'static str {
        "ActionScript 2"
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
        out.push_str("/**\n");
        out.push_str(" * Creates generated instances from the names carried in payloads.\n");
        out.push_str(" */\n");
        out.push_str(&format!("class {} {{\n\n", self.index_class()));
        out.push_str("\tprivate static var objects:Object = null;\n");
        out.push_str("\tprivate static var components:Object = null;\n");
        out.push_str("\tprivate static var results:Object = null;\n\n");

        out.push_str("\tprivate static function init():Void {\n");
        out.push_str("\t\tif (objects !== null) return;\n");
        self.render_table(&mut out, "objects", &index.objects);
        self.render_table(&mut out, "components", &index.components);
        self.render_table(&mut out, "results", &index.results);
        out.push_str("\t}\n\n");

        out.push_str("\tprivate static function create(registry:Object, name:String, json:Object):Object {\n");
        out.push_str("\t\tvar ctor:Function = registry[name.toLowerCase()];\n");
        out.push_str("\t\tif (ctor === undefined) return null;\n");
        out.push_str("\t\treturn new ctor(json);\n");
        out.push_str("\t}\n");

        for (method, registry) in [
            ("CreateObject", "objects"),
            ("CreateComponent", "components"),
            ("CreateResult", "results"),
        ] {
            out.push('\n');
            out.push_str(&format!(
                "\tpublic static function {}(name:String, json:Object):Object {{\n",
                method
            ));
            out.push_str("\t\tinit();\n");
            out.push_str(&format!("\t\treturn create({}, name, json);\n", registry));
            out.push_str("\t}\n");
        }
        out.push_str("}\n");

        Ok(RenderedFile { path, contents: out })
    }

    fn render_runtime(&self) -> Vec<RenderedFile> {
        runtime::per_class(
            runtime::ACTIONSCRIPT2,
            &self.layout.base_dir(),
            &self.layout.file_extension,
            &self.options.namespace,
        )
    }
}
