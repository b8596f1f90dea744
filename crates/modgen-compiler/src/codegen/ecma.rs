//! Setter type checks for the ECMAScript family (JavaScript and ActionScript 2).
//!
//! Both dialects share syntax for everything the setters need. They differ in
//! how a mismatch is surfaced: JavaScript warns and then coerces, while
//! ActionScript throws.

use crate::ir::{Atom, Primitive, Shape, TypeSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    JavaScript,
    ActionScript2,
}

/// Emits the statements that check and store a value.
pub(crate) struct Caster<'a> {
    pub dialect: Dialect,
    pub types: &'a dyn TypeSystem,
    /// Expression naming the generated index class or object.
    pub index: String,
}

fn pad(indent: usize) -> String {
    "\t".repeat(indent)
}

impl Caster<'_> {
    fn mismatch(&self, message: &str) -> String {
        match self.dialect {
            Dialect::JavaScript => format!("console.warn({});", message),
            Dialect::ActionScript2 => format!("throw new Error({});", message),
        }
    }

    fn expected(&self, label: &str, expected: &str, value: &str) -> String {
        self.mismatch(&format!(
            "'Type Mismatch: {} expects {}, got ' + typeof({})",
            label, expected, value
        ))
    }

    fn is_array(&self, value: &str) -> String {
        match self.dialect {
            Dialect::JavaScript => format!("Array.isArray({})", value),
            Dialect::ActionScript2 => format!("({} instanceof Array)", value),
        }
    }

    fn is_fraction(&self, value: &str) -> String {
        match self.dialect {
            Dialect::JavaScript => format!("!Number.isInteger({})", value),
            Dialect::ActionScript2 => format!("Math.round({}) !== {}", value, value),
        }
    }

    fn create_result(&self) -> String {
        match self.dialect {
            Dialect::JavaScript => format!("{}.createResult", self.index),
            Dialect::ActionScript2 => format!("{}.CreateResult", self.index),
        }
    }

    /// Stores `value` into `target`, checking it against `shape`.
    ///
    /// `depth` keeps loop variables of nested lists apart.
    #[allow(clippy::too_many_arguments)]
    pub fn cast(&self, out: &mut String, shape: &Shape, value: &str, target: &str, label: &str, indent: usize, depth: usize) {
        match shape {
            Shape::Single(atom) => self.cast_atom(out, atom, value, target, label, indent),
            Shape::List(element) => self.cast_list(out, element, value, target, label, indent, depth),
            Shape::Either { single, element } => {
                let p = pad(indent);
                out.push_str(&format!("{}if ({}) {{\n", p, self.is_array(value)));
                self.cast_list(out, element, value, target, label, indent + 1, depth);
                out.push_str(&format!("{}}} else {{\n", p));
                self.cast_atom(out, single, value, target, label, indent + 1);
                out.push_str(&format!("{}}}\n", p));
            }
        }
    }

    fn cast_atom(&self, out: &mut String, atom: &Atom, value: &str, target: &str, label: &str, indent: usize) {
        let p = pad(indent);
        match atom {
            Atom::Primitive(Primitive::Int) | Atom::Primitive(Primitive::Float) => {
                out.push_str(&format!(
                    "{}if (typeof({}) !== 'number') {}\n",
                    p,
                    value,
                    self.expected(label, "a number", value)
                ));
                if *atom == Atom::Primitive(Primitive::Int) {
                    out.push_str(&format!(
                        "{}else if ({}) {}\n",
                        p,
                        self.is_fraction(value),
                        self.mismatch(&format!("'Type Mismatch: {} expects an integer, got a float'", label))
                    ));
                }
                out.push_str(&format!("{}{} = Number({});\n", p, target, value));
                out.push_str(&format!("{}if (isNaN({})) {} = null;\n", p, target, target));
            }
            Atom::Primitive(Primitive::String) => {
                out.push_str(&format!(
                    "{}if (typeof({}) !== 'string') {}\n",
                    p,
                    value,
                    self.expected(label, "a string", value)
                ));
                out.push_str(&format!("{}{} = String({});\n", p, target, value));
            }
            Atom::Primitive(Primitive::Boolean) => {
                out.push_str(&format!(
                    "{}if (typeof({}) !== 'boolean') {}\n",
                    p,
                    value,
                    self.expected(label, "a boolean", value)
                ));
                out.push_str(&format!("{}{} = {} ? true : false;\n", p, target, value));
            }
            Atom::Primitive(Primitive::Object) => {
                out.push_str(&format!(
                    "{}if (typeof({}) !== 'object' || {}) {}\n",
                    p,
                    value,
                    self.is_array(value),
                    self.expected(label, "an object", value)
                ));
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
            Atom::Primitive(Primitive::Array) => {
                out.push_str(&format!(
                    "{}if (!{}) {}\n",
                    p,
                    self.is_array(value),
                    self.expected(label, "an array", value)
                ));
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
            Atom::Primitive(Primitive::Mixed) | Atom::Unknown => {
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
            Atom::Object(name) => {
                let class = self.types.object(name);
                out.push_str(&format!("{}if (!({} instanceof {})) {{\n", p, value, class));
                out.push_str(&format!(
                    "{}\tif (typeof({}) === 'object' && !{}) {} = new {}({});\n",
                    p,
                    value,
                    self.is_array(value),
                    value,
                    class,
                    value
                ));
                out.push_str(&format!("{}\telse {}\n", p, self.expected(label, &class, value)));
                out.push_str(&format!("{}}}\n", p));
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
            Atom::Result => {
                let base = self.types.result_base();
                out.push_str(&format!("{}if (!({} instanceof {})) {{\n", p, value, base));
                out.push_str(&format!(
                    "{}\tif (typeof({}) === 'object' && typeof({}.component) === 'string') {{\n",
                    p, value, value
                ));
                out.push_str(&format!(
                    "{}\t\t{} = {}({}.component, {}.data);\n",
                    p,
                    value,
                    self.create_result(),
                    value,
                    value
                ));
                out.push_str(&format!(
                    "{}\t\tif ({} === null) {}\n",
                    p,
                    value,
                    self.mismatch(&format!("'Type Mismatch: {} names an unknown component result'", label))
                ));
                out.push_str(&format!("{}\t}}\n", p));
                out.push_str(&format!("{}\telse {}\n", p, self.expected(label, &base, value)));
                out.push_str(&format!("{}}}\n", p));
                out.push_str(&format!("{}{} = {};\n", p, target, value));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cast_list(&self, out: &mut String, element: &Shape, value: &str, target: &str, label: &str, indent: usize, depth: usize) {
        let p = pad(indent);
        let arr = format!("arr{}", depth);
        let i = format!("i{}", depth);
        let val = format!("val{}", depth);
        let item = format!("item{}", depth);

        out.push_str(&format!("{}if (!{}) {{\n", p, self.is_array(value)));
        out.push_str(&format!("{}\t{}\n", p, self.expected(label, "an array", value)));
        out.push_str(&format!("{}\t{} = {};\n", p, target, value));
        out.push_str(&format!("{}}} else {{\n", p));
        out.push_str(&format!("{}\tvar {} = [];\n", p, arr));
        out.push_str(&format!("{}\tfor (var {} = 0; {} < {}.length; {}++) {{\n", p, i, i, value, i));
        out.push_str(&format!("{}\t\tvar {} = {}[{}];\n", p, val, value, i));
        out.push_str(&format!("{}\t\tif ({} === null || typeof({}) === 'undefined') {{\n", p, val, val));
        out.push_str(&format!("{}\t\t\t{}.push(null);\n", p, arr));
        out.push_str(&format!("{}\t\t\tcontinue;\n", p));
        out.push_str(&format!("{}\t\t}}\n", p));
        out.push_str(&format!("{}\t\tvar {};\n", p, item));
        self.cast(out, element, &val, &item, &format!("{}[]", label), indent + 2, depth + 1);
        out.push_str(&format!("{}\t\t{}.push({});\n", p, arr, item));
        out.push_str(&format!("{}\t}}\n", p));
        out.push_str(&format!("{}\t{} = {};\n", p, target, arr));
        out.push_str(&format!("{}}}\n", p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Js;

    impl TypeSystem for Js {
        fn primitive(&self, p: Primitive) -> String {
            p.as_str().to_string()
        }
        fn object(&self, name: &str) -> String {
            format!("NG_objects_{}", name)
        }
        fn result_base(&self) -> String {
            "BaseResult".into()
        }
        fn unknown(&self) -> String {
            "*".into()
        }
        fn list(&self, e: &str) -> String {
            format!("Array.<{}>", e)
        }
        fn either(&self, s: &str, l: &str) -> String {
            format!("({}|{})", s, l)
        }
    }

    fn caster(dialect: Dialect) -> Caster<'static> {
        Caster {
            dialect,
            types: &Js,
            index: "ObjectIndex".into(),
        }
    }

    #[test]
    fn test_int_cast_warns_in_javascript() {
        let mut out = String::new();
        caster(Dialect::JavaScript).cast(&mut out, &Shape::Single(Atom::Primitive(Primitive::Int)), "_id", "this._id", "User.id", 2, 0);

        assert!(out.contains("if (typeof(_id) !== 'number') console.warn('Type Mismatch: User.id expects a number, got ' + typeof(_id));"));
        assert!(out.contains("else if (!Number.isInteger(_id)) console.warn('Type Mismatch: User.id expects an integer, got a float');"));
        assert!(out.contains("this._id = Number(_id);"));
    }

    #[test]
    fn test_int_cast_throws_in_actionscript() {
        let mut out = String::new();
        caster(Dialect::ActionScript2).cast(&mut out, &Shape::Single(Atom::Primitive(Primitive::Int)), "v", "this.___v", "User.id", 2, 0);

        assert!(out.contains("throw new Error('Type Mismatch: User.id expects a number, got ' + typeof(v));"));
        assert!(out.contains("Math.round(v) !== v"));
        assert!(!out.contains("console.warn"));
    }

    #[test]
    fn test_list_of_objects_rehydrates_elements() {
        let mut out = String::new();
        let shape = Shape::List(Box::new(Shape::Single(Atom::Object("Score".into()))));
        caster(Dialect::JavaScript).cast(&mut out, &shape, "_scores", "this._scores", "getScores.scores", 2, 0);

        assert!(out.contains("for (var i0 = 0; i0 < _scores.length; i0++) {"));
        assert!(out.contains("val0 = new NG_objects_Score(val0);"));
        assert!(out.contains("this._scores = arr0;"));
    }

    #[test]
    fn test_result_defers_to_index() {
        let mut out = String::new();
        caster(Dialect::JavaScript).cast(&mut out, &Shape::Single(Atom::Result), "_result", "this._result", "Response.result", 2, 0);
        assert!(out.contains("_result = ObjectIndex.createResult(_result.component, _result.data);"));

        let mut out = String::new();
        caster(Dialect::ActionScript2).cast(&mut out, &Shape::Single(Atom::Result), "r", "this.___r", "Response.result", 2, 0);
        assert!(out.contains("r = ObjectIndex.CreateResult(r.component, r.data);"));
    }

    #[test]
    fn test_unknown_result_component_is_reported() {
        let mut out = String::new();
        caster(Dialect::JavaScript).cast(&mut out, &Shape::Single(Atom::Result), "_result", "this._result", "Response.result", 2, 0);
        assert!(out.contains(
            "\t\t\t\t_result = ObjectIndex.createResult(_result.component, _result.data);\n\
             \t\t\t\tif (_result === null) console.warn('Type Mismatch: Response.result names an unknown component result');\n"
        ));

        let mut out = String::new();
        caster(Dialect::ActionScript2).cast(&mut out, &Shape::Single(Atom::Result), "r", "this.___r", "Response.result", 2, 0);
        assert!(out.contains("if (r === null) throw new Error('Type Mismatch: Response.result names an unknown component result');"));
    }

    #[test]
    fn test_mixed_is_assigned_as_is() {
        let mut out = String::new();
        caster(Dialect::JavaScript).cast(&mut out, &Shape::Single(Atom::Primitive(Primitive::Mixed)), "v", "this._v", "X.v", 0, 0);
        assert_eq!(out, "this._v = v;\n");
    }
}
