use once_cell::sync::Lazy;

use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};

/// A system function or a class/type method from the runtime library.
#[derive(Debug, PartialEq, Eq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    /// `base.Channel` for class methods, `string`/`array` for type methods.
    pub owner: Option<&'static str>,
    /// `(name, type)` pairs.
    pub params: &'static [(&'static str, &'static str)],
    pub returns: &'static [&'static str],
    pub description: &'static str,
    /// Takes any number of arguments; never argument-checked.
    pub variadic: bool,
}

impl BuiltinFunction {
    /// "(system function) string upshift(string str)", with a second
    /// "returning a, b" line when several values come back.
    pub fn documentation(&self) -> String {
        let mut doc = String::from("(system function) ");
        match self.returns {
            [] => doc.push_str("void "),
            [single] => {
                doc.push_str(single);
                doc.push(' ');
            }
            _ => {}
        }
        if let Some(owner) = self.owner {
            doc.push_str(owner);
            doc.push('.');
        }
        doc.push_str(self.name);
        doc.push('(');
        let params: Vec<String> = self.params.iter().map(|(n, t)| format!("{} {}", t, n)).collect();
        doc.push_str(&params.join(", "));
        if self.variadic {
            doc.push_str(if params.is_empty() { "..." } else { ", ..." });
        }
        doc.push(')');
        if self.returns.len() > 1 {
            doc.push_str("\nreturning ");
            doc.push_str(&self.returns.join(", "));
        }
        if !self.description.is_empty() {
            doc.push_str("\n\n");
            doc.push_str(self.description);
        }
        doc
    }

    /// The single return type, whose members chained access reaches.
    pub fn return_type(&self) -> Option<&'static str> {
        match self.returns {
            [single] => Some(single),
            _ => None,
        }
    }
}

/// `status`, `int_flag`, `sqlca`, `true`, `notfound`.
#[derive(Debug, PartialEq, Eq)]
pub struct BuiltinVariable {
    pub name: &'static str,
    pub type_name: &'static str,
    /// `(name, type)` pairs for record-typed globals such as `sqlca`.
    pub fields: &'static [(&'static str, &'static str)],
    pub is_constant: bool,
    pub value: Option<&'static str>,
}

impl BuiltinVariable {
    pub fn documentation(&self) -> String {
        match (self.is_constant, self.value) {
            (true, Some(value)) => format!("(system constant) {} = {}", self.name, value),
            (true, None) => format!("(system constant) {} {}", self.name, self.type_name),
            _ => format!("(system variable) {} {}", self.name, self.type_name),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PackageClass {
    pub name: &'static str,
    pub package: &'static str,
    pub static_methods: &'static [BuiltinFunction],
    pub methods: &'static [BuiltinFunction],
}

impl PackageClass {
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn documentation(&self) -> String {
        format!("class {}", self.qualified_name())
    }

    pub fn static_method(&self, name: &str) -> Option<&'static BuiltinFunction> {
        self.static_methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn method(&self, name: &str) -> Option<&'static BuiltinFunction> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Package {
    pub name: &'static str,
    pub description: &'static str,
    pub classes: &'static [PackageClass],
}

impl Package {
    pub fn class(&self, name: &str) -> Option<&'static PackageClass> {
        self.classes.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn documentation(&self) -> String {
        format!("package {}\n\n{}", self.name, self.description)
    }
}

const fn function(
    name: &'static str,
    params: &'static [(&'static str, &'static str)],
    returns: &'static [&'static str],
    description: &'static str,
) -> BuiltinFunction {
    BuiltinFunction {
        name,
        owner: None,
        params,
        returns,
        description,
        variadic: false,
    }
}

const fn variadic(name: &'static str, returns: &'static [&'static str], description: &'static str) -> BuiltinFunction {
    BuiltinFunction {
        name,
        owner: None,
        params: &[],
        returns,
        description,
        variadic: true,
    }
}

const fn method(
    owner: &'static str,
    name: &'static str,
    params: &'static [(&'static str, &'static str)],
    returns: &'static [&'static str],
) -> BuiltinFunction {
    BuiltinFunction {
        name,
        owner: Some(owner),
        params,
        returns,
        description: "",
        variadic: false,
    }
}

const fn variable(name: &'static str, type_name: &'static str) -> BuiltinVariable {
    BuiltinVariable {
        name,
        type_name,
        fields: &[],
        is_constant: false,
        value: None,
    }
}

const fn constant(name: &'static str, type_name: &'static str, value: &'static str) -> BuiltinVariable {
    BuiltinVariable {
        name,
        type_name,
        fields: &[],
        is_constant: true,
        value: Some(value),
    }
}

pub static SYSTEM_FUNCTIONS: &[BuiltinFunction] = &[
    function("arg_val", &[("position", "int")], &["string"], "Returns a command line argument by position."),
    function("arr_count", &[], &["int"], "Returns the number of rows entered in a program array."),
    function("arr_curr", &[], &["int"], "Returns the current row in a program array."),
    function("ascii", &[("code", "int")], &["char"], "Returns the character for an ASCII code."),
    variadic("cast", &[], "Converts an object reference to another class."),
    function("downshift", &[("str", "string")], &["string"], "Converts a string to lowercase."),
    function("err_get", &[("code", "int")], &["string"], "Returns the text of an error code."),
    function("err_print", &[("code", "int")], &[], "Prints the text of an error code."),
    function("err_quit", &[("code", "int")], &[], "Prints an error message and stops the program."),
    function("errorlog", &[("text", "string")], &[], "Writes a message to the error log."),
    function("fgl_buffertouched", &[], &["boolean"], "Whether the current field input buffer was modified."),
    function("fgl_dialog_getfieldname", &[], &["string"], "Returns the name of the current field."),
    function("fgl_getenv", &[("name", "string")], &["string"], "Returns the value of an environment variable."),
    function("fgl_getkey", &[], &["int"], "Waits for a key and returns its code."),
    function("fgl_keyval", &[("key", "string")], &["int"], "Returns the code of a key name."),
    function("fgl_lastkey", &[], &["int"], "Returns the code of the last key pressed."),
    function("fgl_set_arr_curr", &[("row", "int")], &[], "Moves to a row in a program array."),
    function("fgl_width", &[("str", "string")], &["int"], "Returns the display width of a string."),
    variadic("field_touched", &["boolean"], "Whether any of the listed fields were modified."),
    variadic("get_fldbuf", &["string"], "Returns the input buffer of the listed fields."),
    function("length", &[("str", "string")], &["int"], "Returns the length of a string without trailing blanks."),
    function("mdy", &[("month", "int"), ("day", "int"), ("year", "int")], &["date"], "Builds a date."),
    function("num_args", &[], &["int"], "Returns the number of command line arguments."),
    function("ord", &[("str", "string")], &["int"], "Returns the code of the first character."),
    function("scr_line", &[], &["int"], "Returns the current row of a screen array."),
    function("set_count", &[("count", "int")], &[], "Sets the number of rows of a program array."),
    variadic("sfmt", &["string"], "Formats a string with %n placeholders."),
    function("showhelp", &[("number", "int")], &[], "Displays a help message."),
    function("startlog", &[("file", "string")], &[], "Starts the error log."),
    function("upshift", &[("str", "string")], &["string"], "Converts a string to uppercase."),
];

pub static SYSTEM_VARIABLES: &[BuiltinVariable] = &[
    variable("status", "int"),
    variable("int_flag", "boolean"),
    variable("quit_flag", "boolean"),
    BuiltinVariable {
        name: "sqlca",
        type_name: "record",
        fields: &[
            ("sqlcode", "int"),
            ("sqlerrm", "char(71)"),
            ("sqlerrp", "char(8)"),
            ("sqlerrd", "array[6] of int"),
            ("sqlawarn", "char(8)"),
        ],
        is_constant: false,
        value: None,
    },
    variable("sqlstate", "int"),
    variable("sqlerrmessage", "string"),
    constant("true", "boolean", "1"),
    constant("false", "boolean", "0"),
    constant("notfound", "int", "100"),
];

static STRING_METHODS: &[BuiltinFunction] = &[
    method("string", "append", &[("str", "string")], &["string"]),
    method("string", "equals", &[("str", "string")], &["boolean"]),
    method("string", "equalsIgnoreCase", &[("str", "string")], &["boolean"]),
    method("string", "getCharAt", &[("position", "int")], &["string"]),
    method("string", "getIndexOf", &[("str", "string"), ("start", "int")], &["int"]),
    method("string", "getLength", &[], &["int"]),
    method("string", "subString", &[("start", "int"), ("end", "int")], &["string"]),
    method("string", "toLowerCase", &[], &["string"]),
    method("string", "toUpperCase", &[], &["string"]),
    method("string", "trim", &[], &["string"]),
    method("string", "trimLeft", &[], &["string"]),
    method("string", "trimRight", &[], &["string"]),
];

static ARRAY_METHODS: &[BuiltinFunction] = &[
    method("array", "appendElement", &[], &[]),
    method("array", "clear", &[], &[]),
    method("array", "deleteElement", &[("index", "int")], &[]),
    method("array", "getLength", &[], &["int"]),
    method("array", "insertElement", &[("index", "int")], &[]),
    method("array", "search", &[("key", "string"), ("value", "string")], &["int"]),
];

static LOB_METHODS: &[BuiltinFunction] = &[
    method("text", "getLength", &[], &["int"]),
    method("text", "readFile", &[("path", "string")], &[]),
    method("text", "writeFile", &[("path", "string")], &[]),
];

/// Methods reachable through a variable of a scalar or array type.
pub static STRING_TYPE: PackageClass = PackageClass {
    name: "string",
    package: "",
    static_methods: &[],
    methods: STRING_METHODS,
};

pub static ARRAY_TYPE: PackageClass = PackageClass {
    name: "array",
    package: "",
    static_methods: &[],
    methods: ARRAY_METHODS,
};

pub static LOB_TYPE: PackageClass = PackageClass {
    name: "text",
    package: "",
    static_methods: &[],
    methods: LOB_METHODS,
};

pub static PACKAGES: &[Package] = &[
    Package {
        name: "base",
        description: "Core runtime classes.",
        classes: &[
            PackageClass {
                name: "Application",
                package: "base",
                static_methods: &[
                    method("base.Application", "getArgument", &[("position", "int")], &["string"]),
                    method("base.Application", "getArgumentCount", &[], &["int"]),
                    method("base.Application", "getProgramDir", &[], &["string"]),
                    method("base.Application", "getProgramName", &[], &["string"]),
                    method("base.Application", "getResourceEntry", &[("name", "string")], &["string"]),
                ],
                methods: &[],
            },
            PackageClass {
                name: "Channel",
                package: "base",
                static_methods: &[method("base.Channel", "create", &[], &["base.Channel"])],
                methods: &[
                    method("base.Channel", "close", &[], &[]),
                    method("base.Channel", "isEof", &[], &["boolean"]),
                    method("base.Channel", "openFile", &[("path", "string"), ("mode", "string")], &[]),
                    method("base.Channel", "openPipe", &[("command", "string"), ("mode", "string")], &[]),
                    method("base.Channel", "readLine", &[], &["string"]),
                    method("base.Channel", "setDelimiter", &[("delimiter", "string")], &[]),
                    method("base.Channel", "writeLine", &[("line", "string")], &[]),
                ],
            },
            PackageClass {
                name: "StringBuffer",
                package: "base",
                static_methods: &[method("base.StringBuffer", "create", &[], &["base.StringBuffer"])],
                methods: &[
                    method("base.StringBuffer", "append", &[("str", "string")], &[]),
                    method("base.StringBuffer", "clear", &[], &[]),
                    method("base.StringBuffer", "getLength", &[], &["int"]),
                    method("base.StringBuffer", "replace", &[("old", "string"), ("new", "string"), ("occurrences", "int")], &[]),
                    method("base.StringBuffer", "toString", &[], &["string"]),
                ],
            },
            PackageClass {
                name: "StringTokenizer",
                package: "base",
                static_methods: &[method(
                    "base.StringTokenizer",
                    "create",
                    &[("str", "string"), ("delimiters", "string")],
                    &["base.StringTokenizer"],
                )],
                methods: &[
                    method("base.StringTokenizer", "countTokens", &[], &["int"]),
                    method("base.StringTokenizer", "hasMoreTokens", &[], &["boolean"]),
                    method("base.StringTokenizer", "nextToken", &[], &["string"]),
                ],
            },
            PackageClass {
                name: "TypeInfo",
                package: "base",
                static_methods: &[
                    method("base.TypeInfo", "create", &[("variable", "record")], &["om.DomNode"]),
                    method("base.TypeInfo", "describe", &[("variable", "record")], &["om.DomNode"]),
                ],
                methods: &[],
            },
        ],
    },
    Package {
        name: "ui",
        description: "User interface classes.",
        classes: &[
            PackageClass {
                name: "Interface",
                package: "ui",
                static_methods: &[
                    method("ui.Interface", "frontCall", &[("module", "string"), ("name", "string"), ("params", "string"), ("returns", "string")], &[]),
                    method("ui.Interface", "getDocument", &[], &["om.DomDocument"]),
                    method("ui.Interface", "getRootNode", &[], &["om.DomNode"]),
                    method("ui.Interface", "loadStyles", &[("file", "string")], &[]),
                    method("ui.Interface", "refresh", &[], &[]),
                    method("ui.Interface", "setText", &[("text", "string")], &[]),
                ],
                methods: &[],
            },
            PackageClass {
                name: "Window",
                package: "ui",
                static_methods: &[
                    method("ui.Window", "forName", &[("name", "string")], &["ui.Window"]),
                    method("ui.Window", "getCurrent", &[], &["ui.Window"]),
                ],
                methods: &[
                    method("ui.Window", "getForm", &[], &["ui.Form"]),
                    method("ui.Window", "getNode", &[], &["om.DomNode"]),
                    method("ui.Window", "setText", &[("text", "string")], &[]),
                ],
            },
            PackageClass {
                name: "Form",
                package: "ui",
                static_methods: &[method("ui.Form", "setDefaultInitializer", &[("function", "string")], &[])],
                methods: &[
                    method("ui.Form", "getNode", &[], &["om.DomNode"]),
                    method("ui.Form", "setElementHidden", &[("name", "string"), ("hidden", "int")], &[]),
                    method("ui.Form", "setFieldHidden", &[("name", "string"), ("hidden", "int")], &[]),
                ],
            },
            PackageClass {
                name: "Dialog",
                package: "ui",
                static_methods: &[method("ui.Dialog", "getCurrent", &[], &["ui.Dialog"])],
                methods: &[
                    method("ui.Dialog", "getCurrentRow", &[("screen_array", "string")], &["int"]),
                    method("ui.Dialog", "nextField", &[("name", "string")], &[]),
                    method("ui.Dialog", "setActionActive", &[("name", "string"), ("active", "int")], &[]),
                    method("ui.Dialog", "setFieldActive", &[("name", "string"), ("active", "int")], &[]),
                ],
            },
            PackageClass {
                name: "ComboBox",
                package: "ui",
                static_methods: &[method("ui.ComboBox", "forName", &[("name", "string")], &["ui.ComboBox"])],
                methods: &[
                    method("ui.ComboBox", "addItem", &[("name", "string"), ("text", "string")], &[]),
                    method("ui.ComboBox", "clear", &[], &[]),
                    method("ui.ComboBox", "getItemCount", &[], &["int"]),
                ],
            },
        ],
    },
    Package {
        name: "om",
        description: "DOM and SAX classes.",
        classes: &[
            PackageClass {
                name: "DomDocument",
                package: "om",
                static_methods: &[
                    method("om.DomDocument", "create", &[("tag", "string")], &["om.DomDocument"]),
                    method("om.DomDocument", "createFromXmlFile", &[("file", "string")], &["om.DomDocument"]),
                ],
                methods: &[
                    method("om.DomDocument", "createElement", &[("tag", "string")], &["om.DomNode"]),
                    method("om.DomDocument", "getDocumentElement", &[], &["om.DomNode"]),
                ],
            },
            PackageClass {
                name: "DomNode",
                package: "om",
                static_methods: &[],
                methods: &[
                    method("om.DomNode", "appendChild", &[("node", "om.DomNode")], &[]),
                    method("om.DomNode", "createChild", &[("tag", "string")], &["om.DomNode"]),
                    method("om.DomNode", "getAttribute", &[("name", "string")], &["string"]),
                    method("om.DomNode", "getFirstChild", &[], &["om.DomNode"]),
                    method("om.DomNode", "getTagName", &[], &["string"]),
                    method("om.DomNode", "selectByPath", &[("path", "string")], &["om.NodeList"]),
                    method("om.DomNode", "setAttribute", &[("name", "string"), ("value", "string")], &[]),
                    method("om.DomNode", "writeXml", &[("file", "string")], &[]),
                ],
            },
            PackageClass {
                name: "NodeList",
                package: "om",
                static_methods: &[],
                methods: &[
                    method("om.NodeList", "getLength", &[], &["int"]),
                    method("om.NodeList", "item", &[("index", "int")], &["om.DomNode"]),
                ],
            },
        ],
    },
    Package {
        name: "util",
        description: "Utility classes, imported with `import util`.",
        classes: &[
            PackageClass {
                name: "Math",
                package: "util",
                static_methods: &[
                    method("util.Math", "pow", &[("x", "float"), ("y", "float")], &["float"]),
                    method("util.Math", "rand", &[("max", "int")], &["int"]),
                    method("util.Math", "sqrt", &[("x", "float")], &["float"]),
                ],
                methods: &[],
            },
            PackageClass {
                name: "JSON",
                package: "util",
                static_methods: &[
                    method("util.JSON", "format", &[("json", "string")], &["string"]),
                    method("util.JSON", "parse", &[("json", "string"), ("variable", "record")], &[]),
                    method("util.JSON", "stringify", &[("variable", "record")], &["string"]),
                ],
                methods: &[],
            },
        ],
    },
    Package {
        name: "os",
        description: "Operating system classes, imported with `import os`.",
        classes: &[PackageClass {
            name: "Path",
            package: "os",
            static_methods: &[
                method("os.Path", "basename", &[("path", "string")], &["string"]),
                method("os.Path", "dirname", &[("path", "string")], &["string"]),
                method("os.Path", "exists", &[("path", "string")], &["boolean"]),
                method("os.Path", "join", &[("begin", "string"), ("end", "string")], &["string"]),
                method("os.Path", "separator", &[], &["string"]),
            ],
            methods: &[],
        }],
    },
    Package {
        name: "com",
        description: "Web services classes, imported with `import com`.",
        classes: &[PackageClass {
            name: "WebOperation",
            package: "com",
            static_methods: &[method(
                "com.WebOperation",
                "CreateRPCStyle",
                &[("function", "string"), ("name", "string"), ("input", "record"), ("output", "record")],
                &["com.WebOperation"],
            )],
            methods: &[],
        }],
    },
];

static FUNCTION_INDEX: Lazy<FastHashMap<String, &'static BuiltinFunction>> = Lazy::new(|| {
    let mut map = fast_hash_map_with_capacity(SYSTEM_FUNCTIONS.len());
    for f in SYSTEM_FUNCTIONS {
        map.insert(f.name.to_ascii_lowercase(), f);
    }
    map
});

static VARIABLE_INDEX: Lazy<FastHashMap<String, &'static BuiltinVariable>> = Lazy::new(|| {
    let mut map = fast_hash_map_with_capacity(SYSTEM_VARIABLES.len());
    for v in SYSTEM_VARIABLES {
        map.insert(v.name.to_ascii_lowercase(), v);
    }
    map
});

pub fn system_function(name: &str) -> Option<&'static BuiltinFunction> {
    FUNCTION_INDEX.get(&name.to_ascii_lowercase()).copied()
}

pub fn system_variable(name: &str) -> Option<&'static BuiltinVariable> {
    VARIABLE_INDEX.get(&name.to_ascii_lowercase()).copied()
}

pub fn package(name: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Looks up `pkg.Class` or one of the type pseudo-classes (`string`,
/// `text`, `byte`).
pub fn class(qualified: &str) -> Option<&'static PackageClass> {
    match qualified.split_once('.') {
        Some((pkg, name)) => package(pkg)?.class(name),
        None if qualified.eq_ignore_ascii_case("string") => Some(&STRING_TYPE),
        None if qualified.eq_ignore_ascii_case("text") || qualified.eq_ignore_ascii_case("byte") => {
            Some(&LOB_TYPE)
        }
        None => None,
    }
}
