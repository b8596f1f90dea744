//! C# back-end.
//!
//! Properties are strongly typed. Decoding from parsed JSON goes through a
//! generated `SetProperty` override that checks each value before storing it
//! and reports mismatches through the base class.

use super::naming::{self, quote, BANNER};
use super::{runtime, EntityIndex, IndexEntry, Layout, PartialHooks, RenderOptions, RenderedFile, Renderer};
use crate::diagnostic::ModgenError;
use crate::ir::{Atom, Entity, EntityKind, Primitive, Property, Shape, TypeSystem};

const DICTIONARY: &str = "Dictionary<string, object>";
const ILIST: &str = "System.Collections.IList";

pub struct CSharpRenderer {
    layout: Layout,
    options: RenderOptions,
}

struct CsTypes<'a> {
    options: &'a RenderOptions,
}

impl TypeSystem for CsTypes<'_> {
    fn primitive(&self, primitive: Primitive) -> String {
        match primitive {
            Primitive::Int => "int?",
            Primitive::Float => "double?",
            Primitive::String => "string",
            Primitive::Boolean => "bool?",
            Primitive::Object => DICTIONARY,
            Primitive::Array => "List<object>",
            Primitive::Mixed => "object",
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
        "object".to_string()
    }

    fn list(&self, element: &str) -> String {
        format!("List<{}>", element)
    }

    fn either(&self, _single: &str, _list: &str) -> String {
        "object".to_string()
    }
}

fn pad(indent: usize) -> String {
    "\t".repeat(indent)
}

/// Escapes text for XML doc comments.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Emits the statements converting an `object` into a typed value.
struct Converter<'a> {
    types: &'a CsTypes<'a>,
    index: String,
}

impl Converter<'_> {
    fn mismatch(&self, label: &str, expected: &str, value: &str) -> String {
        format!("TypeMismatch({}, {}, {});", quote(label), quote(expected), value)
    }

    /// Assigns `value` converted to `shape` into `target`. Every path assigns.
    #[allow(clippy::too_many_arguments)]
    fn convert(&self, out: &mut String, shape: &Shape, value: &str, target: &str, label: &str, indent: usize, depth: usize) {
        match shape {
            Shape::Single(atom) => self.convert_atom(out, atom, value, target, label, indent, depth),
            Shape::List(element) => self.convert_list(out, element, value, target, label, indent, depth),
            // Polymorphic slots are split by the caller.
            Shape::Either { single, .. } => self.convert_atom(out, single, value, target, label, indent, depth),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_atom(&self, out: &mut String, atom: &Atom, value: &str, target: &str, label: &str, indent: usize, depth: usize) {
        let p = pad(indent);
        match atom {
            Atom::Primitive(Primitive::Int) | Atom::Primitive(Primitive::Float) => {
                // Fractions never reach Convert.ToInt32, which would round them.
                let (guard, convert, expected) = if *atom == Atom::Primitive(Primitive::Int) {
                    (
                        format!("IsNumber({v}) && Convert.ToDouble({v}) % 1 == 0", v = value),
                        "Convert.ToInt32",
                        "an integer",
                    )
                } else {
                    (format!("IsNumber({})", value), "Convert.ToDouble", "a number")
                };
                out.push_str(&format!("{}if ({}) {} = {}({});\n", p, guard, target, convert, value));
                out.push_str(&format!("{}else\n", p));
                out.push_str(&format!("{}{{\n", p));
                out.push_str(&format!("{}\t{}\n", p, self.mismatch(label, expected, value)));
                out.push_str(&format!("{}\t{} = null;\n", p, target));
                out.push_str(&format!("{}}}\n", p));
            }
            Atom::Primitive(Primitive::String) => {
                out.push_str(&format!("{}if (!({} is string)) {}\n", p, value, self.mismatch(label, "a string", value)));
                out.push_str(&format!("{}{} = Convert.ToString({});\n", p, target, value));
            }
            Atom::Primitive(Primitive::Boolean) => {
                out.push_str(&format!("{}if (!({} is bool)) {}\n", p, value, self.mismatch(label, "a boolean", value)));
                out.push_str(&format!("{}{} = IsTruthy({});\n", p, target, value));
            }
            Atom::Primitive(Primitive::Object) => self.convert_cast(out, DICTIONARY, "an object", value, target, label, indent),
            Atom::Primitive(Primitive::Array) => self.convert_cast(out, "List<object>", "a list", value, target, label, indent),
            Atom::Primitive(Primitive::Mixed) | Atom::Unknown => {
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
            Atom::Object(name) => {
                let class = self.types.object(name);
                let obj = format!("obj{}", depth);
                out.push_str(&format!("{}if ({} is {}) {} = ({}){};\n", p, value, class, target, class, value));
                out.push_str(&format!("{}else if ({} is {})\n", p, value, DICTIONARY));
                out.push_str(&format!("{}{{\n", p));
                out.push_str(&format!("{}\tvar {} = new {}();\n", p, obj, class));
                out.push_str(&format!("{}\t{}.FromJSON({});\n", p, obj, value));
                out.push_str(&format!("{}\t{} = {};\n", p, target, obj));
                out.push_str(&format!("{}}}\n", p));
                out.push_str(&format!("{}else\n", p));
                out.push_str(&format!("{}{{\n", p));
                out.push_str(&format!("{}\t{}\n", p, self.mismatch(label, &class, value)));
                out.push_str(&format!("{}\t{} = null;\n", p, target));
                out.push_str(&format!("{}}}\n", p));
            }
            Atom::Result => {
                let base = self.types.result_base();
                let json = format!("json{}", depth);
                out.push_str(&format!("{}if ({} is {}) {} = ({}){};\n", p, value, base, target, base, value));
                out.push_str(&format!(
                    "{}else if ({} is {} && (({}){}).ContainsKey(\"component\"))\n",
                    p, value, DICTIONARY, DICTIONARY, value
                ));
                out.push_str(&format!("{}{{\n", p));
                out.push_str(&format!("{}\tvar {} = ({}){};\n", p, json, DICTIONARY, value));
                out.push_str(&format!(
                    "{}\t{} = {}.CreateResult(Convert.ToString({j}[\"component\"]), {j}.ContainsKey(\"data\") ? {j}[\"data\"] : null);\n",
                    p,
                    target,
                    self.index,
                    j = json
                ));
                out.push_str(&format!("{}}}\n", p));
                out.push_str(&format!("{}else\n", p));
                out.push_str(&format!("{}{{\n", p));
                out.push_str(&format!("{}\t{}\n", p, self.mismatch(label, &base, value)));
                out.push_str(&format!("{}\t{} = null;\n", p, target));
                out.push_str(&format!("{}}}\n", p));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_cast(&self, out: &mut String, ty: &str, expected: &str, value: &str, target: &str, label: &str, indent: usize) {
        let p = pad(indent);
        out.push_str(&format!("{}if ({} is {}) {} = ({}){};\n", p, value, ty, target, ty, value));
        out.push_str(&format!("{}else\n", p));
        out.push_str(&format!("{}{{\n", p));
        out.push_str(&format!("{}\t{}\n", p, self.mismatch(label, expected, value)));
        out.push_str(&format!("{}\t{} = null;\n", p, target));
        out.push_str(&format!("{}}}\n", p));
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_list(&self, out: &mut String, element: &Shape, value: &str, target: &str, label: &str, indent: usize, depth: usize) {
        let p = pad(indent);
        let element_type = element.native_type(self.types);
        let list = format!("list{}", depth);
        let val = format!("val{}", depth);
        let item = format!("item{}", depth);

        out.push_str(&format!("{}if ({} is {})\n", p, value, ILIST));
        out.push_str(&format!("{}{{\n", p));
        out.push_str(&format!("{}\tvar {} = new List<{}>();\n", p, list, element_type));
        out.push_str(&format!("{}\tforeach (object {} in ({}){})\n", p, val, ILIST, value));
        out.push_str(&format!("{}\t{{\n", p));
        out.push_str(&format!("{}\t\t{} {};\n", p, element_type, item));
        out.push_str(&format!("{}\t\tif ({} == null) {} = null;\n", p, val, item));
        out.push_str(&format!("{}\t\telse\n", p));
        out.push_str(&format!("{}\t\t{{\n", p));
        self.convert(out, element, &val, &item, &format!("{}[]", label), indent + 3, depth + 1);
        out.push_str(&format!("{}\t\t}}\n", p));
        out.push_str(&format!("{}\t\t{}.Add({});\n", p, list, item));
        out.push_str(&format!("{}\t}}\n", p));
        out.push_str(&format!("{}\t{} = {};\n", p, target, list));
        out.push_str(&format!("{}}}\n", p));
        out.push_str(&format!("{}else\n", p));
        out.push_str(&format!("{}{{\n", p));
        out.push_str(&format!("{}\t{}\n", p, self.mismatch(label, "a list", value)));
        out.push_str(&format!("{}\t{} = null;\n", p, target));
        out.push_str(&format!("{}}}\n", p));
    }
}

impl CSharpRenderer {
    pub fn new(layout: Layout, options: RenderOptions) -> Self {
        Self { layout, options }
    }

    fn types(&self) -> CsTypes<'_> {
        CsTypes { options: &self.options }
    }

    fn index_class(&self) -> String {
        format!("{}.ObjectIndex", self.options.namespace)
    }

    /// `(namespace, class)`.
    fn class_name(&self, entity: &Entity) -> (String, String) {
        let root = &self.options.namespace;
        match (entity.kind, &entity.namespace, &entity.method) {
            (EntityKind::Component, Some(component), Some(method)) => {
                (format!("{}.components.{}", root, component), method.clone())
            }
            (EntityKind::Result, Some(component), Some(method)) => {
                (format!("{}.results.{}", root, component), method.clone())
            }
            _ => (
                format!("{}.objects", root),
                self.options.class_name(&entity.name).to_string(),
            ),
        }
    }

    fn qualified(&self, entity: &Entity) -> String {
        let (namespace, class) = self.class_name(entity);
        format!("{}.{}", namespace, class)
    }

    fn base_class(&self, kind: EntityKind) -> String {
        let base = match kind {
            EntityKind::Object => "BaseObject",
            EntityKind::Component => "BaseComponent",
            EntityKind::Result => "BaseResult",
        };
        format!("{}.{}", self.options.namespace, base)
    }

    fn push_summary(out: &mut String, lines: &[String], indent: &str) {
        if lines.is_empty() {
            return;
        }
        out.push_str(&format!("{}/// <summary>\n", indent));
        for line in lines {
            out.push_str(&format!("{}/// {}\n", indent, xml_escape(line)));
        }
        out.push_str(&format!("{}/// </summary>\n", indent));
    }

    fn render_entity(&self, entity: &Entity, hooks: &PartialHooks) -> Result<RenderedFile, ModgenError> {
        let types = self.types();
        let path = self.layout.file_for(entity, self.options.class_name(&entity.name));
        let (namespace, class) = self.class_name(entity);

        if entity.uses_result_lookup() && self.layout.index_file.is_none() {
            return Err(ModgenError::render(
                &entity.name,
                "a property refers to Result but no index_file is configured",
            ));
        }

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");
        out.push_str("using System;\n");
        out.push_str("using System.Collections.Generic;\n");
        naming::push_partial(&mut out, hooks.import.as_ref());
        out.push('\n');

        out.push_str(&format!("namespace {}\n{{\n", namespace));
        let summary: Vec<String> = entity
            .description
            .as_deref()
            .map(|d| naming::description_lines(d, |n| types.object(n)))
            .unwrap_or_default();
        Self::push_summary(&mut out, &summary, "\t");
        out.push_str(&format!("\tpublic class {} : {}\n\t{{\n", class, self.base_class(entity.kind)));

        // Backing fields
        for prop in &entity.properties {
            if prop.is_polymorphic() {
                let single = prop.shape.single().map(|a| a.native_type(&types)).unwrap_or_else(|| types.unknown());
                let list = prop
                    .shape
                    .element()
                    .map(|e| types.list(&e.native_type(&types)))
                    .unwrap_or_else(|| types.list("object"));
                out.push_str(&format!("\t\tprivate {} _{};\n", single, prop.name));
                out.push_str(&format!("\t\tprivate {} _{}List;\n", list, prop.name));
                out.push_str(&format!("\t\tprivate bool _{}IsList;\n", prop.name));
            } else {
                out.push_str(&format!("\t\tprivate {} _{};\n", prop.native_type(&types), prop.name));
            }
        }
        naming::push_partial(&mut out, hooks.properties.as_ref());

        // Constructor
        if !entity.properties.is_empty() || hooks.properties.is_some() {
            out.push('\n');
        }
        out.push_str(&format!("\t\tpublic {}()\n\t\t{{\n", class));
        out.push_str(&format!("\t\t\t__object = {};\n", quote(&entity.name)));
        out.push_str(&format!(
            "\t\t\t__properties = new List<string> {{ {} }};\n",
            naming::quote_list(entity.properties.iter().map(|p| p.name.as_str()))
        ));
        out.push_str(&format!(
            "\t\t\t__required = new List<string> {{ {} }};\n",
            naming::quote_list(entity.required.iter().map(String::as_str))
        ));
        let object_map: Vec<String> = entity
            .object_map
            .iter()
            .map(|(prop, object)| format!("{{ {}, {} }}", quote(prop), quote(object)))
            .collect();
        out.push_str(&format!(
            "\t\t\t__objectMap = new Dictionary<string, string> {{ {} }};\n",
            object_map.join(", ")
        ));
        if entity.kind == EntityKind::Component {
            out.push_str(&format!("\t\t\t__isSecure = {};\n", entity.flags.secure));
            out.push_str(&format!("\t\t\t__requireSession = {};\n", entity.flags.require_session));
            out.push_str(&format!("\t\t\t__isRedirect = {};\n", entity.flags.redirect));
        }
        for prop in &entity.properties {
            if let Some(default) = prop.default_value() {
                out.push_str(&format!("\t\t\tSetProperty({}, {});\n", quote(&prop.name), csharp_literal(default)));
            }
        }
        naming::push_partial(&mut out, hooks.constructor.as_ref());
        out.push_str("\t\t}\n");

        // Typed accessors
        for prop in &entity.properties {
            out.push('\n');
            self.render_accessors(&mut out, entity, prop);
        }

        // Decoding
        out.push('\n');
        self.render_set_property(&mut out, entity);

        if let Some(class_partial) = &hooks.class {
            out.push('\n');
            naming::push_partial(&mut out, Some(class_partial));
        }
        out.push_str("\t}\n}\n");

        Ok(RenderedFile { path, contents: out })
    }

    fn render_accessors(&self, out: &mut String, entity: &Entity, prop: &Property) {
        let types = self.types();
        let name = &prop.name;

        let mut doc: Vec<String> = prop
            .description
            .as_deref()
            .map(|d| naming::description_lines(d, |n| types.object(n)))
            .unwrap_or_default();
        if entity.is_required(name) {
            doc.push("Required.".to_string());
        }
        Self::push_summary(out, &doc, "\t\t");

        if !prop.is_polymorphic() {
            out.push_str(&format!("\t\tpublic {} {}\n", prop.native_type(&types), name));
            out.push_str("\t\t{\n");
            out.push_str(&format!("\t\t\tget {{ return _{}; }}\n", name));
            out.push_str(&format!("\t\t\tset {{ _{} = value; }}\n", name));
            out.push_str("\t\t}\n");
            return;
        }

        let list = prop
            .shape
            .element()
            .map(|e| types.list(&e.native_type(&types)))
            .unwrap_or_else(|| types.list("object"));

        out.push_str(&format!("\t\tpublic object {}\n", name));
        out.push_str("\t\t{\n");
        out.push_str(&format!("\t\t\tget {{ return _{n}IsList ? (object)_{n}List : _{n}; }}\n", n = name));
        out.push_str(&format!("\t\t\tset {{ SetProperty({}, value); }}\n", quote(name)));
        out.push_str("\t\t}\n\n");

        out.push_str(&format!("\t\t/// <summary>\n\t\t/// The list form of <c>{}</c>.\n\t\t/// </summary>\n", name));
        out.push_str(&format!("\t\tpublic {} {}List\n", list, name));
        out.push_str("\t\t{\n");
        out.push_str(&format!("\t\t\tget {{ return _{}List; }}\n", name));
        out.push_str("\t\t\tset\n");
        out.push_str("\t\t\t{\n");
        out.push_str(&format!("\t\t\t\t_{}List = value;\n", name));
        out.push_str(&format!("\t\t\t\t_{} = null;\n", name));
        out.push_str(&format!("\t\t\t\t_{}IsList = value != null;\n", name));
        out.push_str("\t\t\t}\n");
        out.push_str("\t\t}\n\n");

        out.push_str(&format!("\t\t/// <summary>\n\t\t/// True when <c>{}</c> currently holds a list.\n\t\t/// </summary>\n", name));
        out.push_str(&format!("\t\tpublic bool {}IsList\n", name));
        out.push_str("\t\t{\n");
        out.push_str(&format!("\t\t\tget {{ return _{}IsList; }}\n", name));
        out.push_str("\t\t}\n");
    }

    fn render_set_property(&self, out: &mut String, entity: &Entity) {
        let types = self.types();
        let converter = Converter {
            types: &types,
            index: self.index_class(),
        };

        out.push_str("\t\tpublic override void SetProperty(string name, object value)\n");
        out.push_str("\t\t{\n");
        out.push_str("\t\t\tswitch (name)\n");
        out.push_str("\t\t\t{\n");
        for prop in &entity.properties {
            let name = &prop.name;
            let label = format!("{}.{}", entity.name, name);
            out.push_str(&format!("\t\t\t\tcase {}:\n", quote(name)));
            out.push_str("\t\t\t\t{\n");

            if prop.is_polymorphic() {
                out.push_str("\t\t\t\t\tif (value == null)\n");
                out.push_str("\t\t\t\t\t{\n");
                out.push_str(&format!("\t\t\t\t\t\t_{} = null;\n", name));
                out.push_str(&format!("\t\t\t\t\t\t_{}List = null;\n", name));
                out.push_str(&format!("\t\t\t\t\t\t_{}IsList = false;\n", name));
                out.push_str("\t\t\t\t\t\tbreak;\n");
                out.push_str("\t\t\t\t\t}\n");
                out.push_str(&format!("\t\t\t\t\tif (value is {})\n", ILIST));
                out.push_str("\t\t\t\t\t{\n");
                if let Some(element) = prop.shape.element() {
                    converter.convert_list(out, element, "value", &format!("_{}List", name), &label, 6, 0);
                }
                out.push_str(&format!("\t\t\t\t\t\t_{} = null;\n", name));
                out.push_str(&format!("\t\t\t\t\t\t_{}IsList = true;\n", name));
                out.push_str("\t\t\t\t\t\tbreak;\n");
                out.push_str("\t\t\t\t\t}\n");
                converter.convert(out, &prop.shape, "value", &format!("_{}", name), &label, 5, 0);
                out.push_str(&format!("\t\t\t\t\t_{}List = null;\n", name));
                out.push_str(&format!("\t\t\t\t\t_{}IsList = false;\n", name));
            } else {
                out.push_str("\t\t\t\t\tif (value == null)\n");
                out.push_str("\t\t\t\t\t{\n");
                out.push_str(&format!("\t\t\t\t\t\t_{} = null;\n", name));
                out.push_str("\t\t\t\t\t\tbreak;\n");
                out.push_str("\t\t\t\t\t}\n");
                if prop.requires_runtime_check() {
                    converter.convert(out, &prop.shape, "value", &format!("_{}", name), &label, 5, 0);
                } else {
                    out.push_str(&format!("\t\t\t\t\t_{} = value;\n", name));
                }
            }

            out.push_str("\t\t\t\t\tbreak;\n");
            out.push_str("\t\t\t\t}\n");
        }
        out.push_str("\t\t\t\tdefault:\n");
        out.push_str("\t\t\t\t\tbase.SetProperty(name, value);\n");
        out.push_str("\t\t\t\t\tbreak;\n");
        out.push_str("\t\t\t}\n");
        out.push_str("\t\t}\n");
    }

    fn render_table(&self, out: &mut String, field: &str, base: &str, entries: &[IndexEntry<'_>]) {
        let ty = format!("Dictionary<string, Func<{}>>", base);
        out.push_str(&format!("\t\tprivate static readonly {} {} = new {}\n", ty, field, ty));
        out.push_str("\t\t{\n");
        for entry in entries {
            out.push_str(&format!(
                "\t\t\t{{ {}, () => new {}() }},\n",
                quote(&entry.key),
                self.qualified(entry.entity)
            ));
        }
        out.push_str("\t\t};\n\n");
    }
}

/// A schema default as a C# literal boxed into `object`.
fn csharp_literal(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) if n.is_f64() => format!("{}d", n),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        // Structured defaults are left unset.
        Value::Array(_) | Value::Object(_) => "null".to_string(),
    }
}

impl Renderer for CSharpRenderer {
    fn language(&self) -> &'static str {
        "C#"
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
        let root = &self.options.namespace;

        let mut out = String::new();
        out.push_str(BANNER);
        out.push_str("\n\n");
        out.push_str("using System;\n");
        out.push_str("using System.Collections.Generic;\n\n");
        out.push_str(&format!("namespace {}\n{{\n", root));
        out.push_str("\t/// <summary>\n");
        out.push_str("\t/// Creates generated instances from the names carried in payloads.\n");
        out.push_str("\t/// </summary>\n");
        out.push_str("\tpublic static class ObjectIndex\n\t{\n");

        self.render_table(&mut out, "Objects", &self.base_class(EntityKind::Object), &index.objects);
        self.render_table(&mut out, "Components", &self.base_class(EntityKind::Component), &index.components);
        self.render_table(&mut out, "Results", &self.base_class(EntityKind::Result), &index.results);

        for (method, field, kind) in [
            ("CreateObject", "Objects", EntityKind::Object),
            ("CreateComponent", "Components", EntityKind::Component),
            ("CreateResult", "Results", EntityKind::Result),
        ] {
            let base = self.base_class(kind);
            out.push_str(&format!("\t\tpublic static {} {}(string name, object json)\n", base, method));
            out.push_str("\t\t{\n");
            out.push_str(&format!("\t\t\tFunc<{}> ctor;\n", base));
            out.push_str(&format!(
                "\t\t\tif (name == null || !{}.TryGetValue(name.ToLower(), out ctor)) return null;\n",
                field
            ));
            out.push_str("\t\t\tvar instance = ctor();\n");
            out.push_str("\t\t\tif (json != null) instance.FromJSON(json);\n");
            out.push_str("\t\t\treturn instance;\n");
            out.push_str("\t\t}\n");
            if kind != EntityKind::Result {
                out.push('\n');
            }
        }
        out.push_str("\t}\n}\n");

        Ok(RenderedFile { path, contents: out })
    }

    fn render_runtime(&self) -> Vec<RenderedFile> {
        runtime::per_class(runtime::CSHARP, &self.layout.base_dir(), &self.layout.file_extension, &self.options.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{collect, CollectOptions};
    use crate::schema::SchemaDocument;
    use std::path::PathBuf;

    fn renderer(index_file: Option<&str>) -> CSharpRenderer {
        CSharpRenderer::new(
            Layout {
                objects_dir: "NewgroundsIO/objects".into(),
                components_dir: "NewgroundsIO/components".into(),
                results_dir: "NewgroundsIO/results".into(),
                index_file: index_file.map(PathBuf::from),
                file_extension: ".cs".into(),
                runtime_module: None,
            },
            RenderOptions {
                namespace: "NewgroundsIO".into(),
                ..Default::default()
            },
        )
    }

    fn model(json: &str) -> crate::ir::SchemaModel {
        collect(&SchemaDocument::from_json(json, "test").unwrap(), CollectOptions::default())
    }

    #[test]
    fn test_object_declarations() {
        let model = model(
            r#"{"objects":{"User":{"description":"A player & their <icons>.","properties":{
                "id":{"type":"int","required":true},
                "name":{"type":"string"},
                "icons":{"object":"UserIcons"}}}},"components":{}}"#,
        );
        let file = renderer(None).render_object(&model.objects[0], &PartialHooks::default()).unwrap();

        assert_eq!(file.path, PathBuf::from("NewgroundsIO/objects/User.cs"));
        assert!(file.contents.contains("namespace NewgroundsIO.objects\n{"));
        assert!(file.contents.contains("\t/// A player &amp; their &lt;icons&gt;.\n"));
        assert!(file.contents.contains("\tpublic class User : NewgroundsIO.BaseObject\n"));
        assert!(file.contents.contains("\t\tprivate int? _id;\n"));
        assert!(file.contents.contains("\t\tpublic NewgroundsIO.objects.UserIcons icons\n"));
        assert!(file.contents.contains("__required = new List<string> { \"id\" };"));
        assert!(file.contents.contains("__objectMap = new Dictionary<string, string> { { \"icons\", \"UserIcons\" } };"));
        assert!(!file.contents.contains("if (IsNumber(value)) _id = Convert.ToInt32(value);"));
        assert!(file.contents.contains("TypeMismatch(\"User.name\", \"a string\", value);"));
        assert!(file.contents.contains("var obj0 = new NewgroundsIO.objects.UserIcons();"));
        assert!(file.contents.contains("\t\t\t\tdefault:\n\t\t\t\t\tbase.SetProperty(name, value);\n"));
    }

    #[test]
    fn test_int_rejects_fractions() {
        let model = model(r#"{"objects":{"Medal":{"properties":{"id":{"type":"int"},"ratio":{"type":"float"}}}},"components":{}}"#);
        let file = renderer(None).render_object(&model.objects[0], &PartialHooks::default()).unwrap();

        let int_case = "\t\t\t\t\tif (IsNumber(value) && Convert.ToDouble(value) % 1 == 0) _id = Convert.ToInt32(value);\n\
                        \t\t\t\t\telse\n\
                        \t\t\t\t\t{\n\
                        \t\t\t\t\t\tTypeMismatch(\"Medal.id\", \"an integer\", value);\n\
                        \t\t\t\t\t\t_id = null;\n";
        assert!(file.contents.contains(int_case), "{}", file.contents);
        assert!(file.contents.contains("if (IsNumber(value)) _ratio = Convert.ToDouble(value);"));
        assert_eq!(file.contents.matches("Convert.ToInt32(").count(), 1);
    }

    #[test]
    fn test_component_namespace_and_flags() {
        let model = model(r#"{"objects":{},"components":{"ScoreBoard":{"methods":{"postScore":{"secure":true,"requireSession":true,"params":{"value":{"type":"int","default":0}}}}}}}"#);
        let hooks = PartialHooks {
            import: Some("using System.Text;\n".into()),
            ..Default::default()
        };
        let file = renderer(None).render_component(&model.components[0], &hooks).unwrap();

        assert_eq!(file.path, PathBuf::from("NewgroundsIO/components/ScoreBoard/postScore.cs"));
        assert!(file.contents.contains("using System.Collections.Generic;\nusing System.Text;\n"));
        assert!(file.contents.contains("namespace NewgroundsIO.components.ScoreBoard\n"));
        assert!(file.contents.contains("\tpublic class postScore : NewgroundsIO.BaseComponent\n"));
        assert!(file.contents.contains("__isSecure = true;"));
        assert!(file.contents.contains("__requireSession = true;"));
        assert!(file.contents.contains("SetProperty(\"value\", 0);"));
    }

    #[test]
    fn test_list_of_objects_decodes_elements() {
        let model = model(r#"{"objects":{},"components":{"ScoreBoard":{"methods":{"getScores":{"return":{"scores":{"array":{"object":"Score"}}}}}}}}"#);
        let file = renderer(None).render_result(&model.results[0], &PartialHooks::default()).unwrap();

        assert!(file.contents.contains("\t\tprivate List<NewgroundsIO.objects.Score> _scores;\n"));
        assert!(file.contents.contains("var list0 = new List<NewgroundsIO.objects.Score>();"));
        assert!(file.contents.contains("foreach (object val0 in (System.Collections.IList)value)"));
        assert!(file.contents.contains("var obj1 = new NewgroundsIO.objects.Score();"));
        assert!(file.contents.contains("_scores = list0;"));
    }

    #[test]
    fn test_polymorphic_property() {
        let model = model(r#"{"objects":{"Response":{"properties":{"result":{"object":"Result","array":{"object":"Result"}}}}},"components":{}}"#);
        let file = renderer(Some("NewgroundsIO/ObjectIndex.cs"))
            .render_object(&model.objects[0], &PartialHooks::default())
            .unwrap();

        assert!(file.contents.contains("\t\tprivate NewgroundsIO.BaseResult _result;\n"));
        assert!(file.contents.contains("\t\tprivate List<NewgroundsIO.BaseResult> _resultList;\n"));
        assert!(file.contents.contains("get { return _resultIsList ? (object)_resultList : _result; }"));
        assert!(file.contents.contains("NewgroundsIO.ObjectIndex.CreateResult(Convert.ToString(json0[\"component\"])"));
        assert!(file.contents.contains("\t\tpublic bool resultIsList\n"));

        // Each form clears the other.
        assert!(file.contents.contains("\t\t\t\t_resultList = value;\n\t\t\t\t_result = null;\n\t\t\t\t_resultIsList = value != null;\n"));
        assert!(file.contents.contains("\t\t\t\t\t\t_result = null;\n\t\t\t\t\t\t_resultIsList = true;\n"));
        assert!(file.contents.contains("\t\t\t\t\t_resultList = null;\n\t\t\t\t\t_resultIsList = false;\n"));

        let err = renderer(None).render_object(&model.objects[0], &PartialHooks::default()).unwrap_err();
        assert!(matches!(err, ModgenError::Render { .. }));
    }

    #[test]
    fn test_index_registry() {
        let model = model(r#"{"objects":{"User":{}},"components":{"ScoreBoard":{"methods":{"getScores":{}}}}}"#);
        let index = EntityIndex::build(&model);
        let file = renderer(Some("NewgroundsIO/ObjectIndex.cs")).render_index(&index).unwrap();

        assert!(file.contents.contains("\tpublic static class ObjectIndex\n"));
        assert!(file.contents.contains("{ \"user\", () => new NewgroundsIO.objects.User() },"));
        assert!(file.contents.contains("{ \"scoreboard.getscores\", () => new NewgroundsIO.results.ScoreBoard.getScores() },"));
        assert!(file.contents.contains("public static NewgroundsIO.BaseResult CreateResult(string name, object json)"));
        assert!(file.contents.contains("Results.TryGetValue(name.ToLower(), out ctor)"));
    }

    #[test]
    fn test_runtime_classes_share_root_namespace() {
        let files = renderer(None).render_runtime();
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("NewgroundsIO/BaseObject.cs"),
                PathBuf::from("NewgroundsIO/BaseComponent.cs"),
                PathBuf::from("NewgroundsIO/BaseResult.cs"),
            ]
        );
        assert!(files.iter().all(|f| f.contents.contains("namespace NewgroundsIO\n{")));
        assert!(files[2].contents.contains("public class BaseResult : BaseObject"));
    }
}
