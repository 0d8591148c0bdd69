use crate::analysis::LocationInfo;

/// Schema lookups for `like table.column` types. Implementations are shared
/// between parses running on different threads.
pub trait DatabaseInformationProvider: Send + Sync {
    fn column_type(&self, table: &str, column: &str) -> Option<String>;

    /// `(column, type)` pairs in table order.
    fn table_columns(&self, _table: &str) -> Vec<(String, String)> {
        Vec::new()
    }

    fn tables(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Functions defined outside the module and its project, searched after
/// the analysis pass.
pub trait FunctionProvider: Send + Sync {
    fn find_function(&self, name: &str) -> Option<ExternalFunction>;

    fn function_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A function signature supplied by a [`FunctionProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalFunction {
    pub name: String,
    /// `(name, type)` pairs.
    pub parameters: Vec<(String, String)>,
    pub returns: Vec<String>,
    pub documentation: String,
    pub location: Option<LocationInfo>,
}

impl ExternalFunction {
    pub fn documentation(&self) -> String {
        let mut doc = String::from("(program function) ");
        match self.returns.as_slice() {
            [] => doc.push_str("void "),
            [single] => {
                doc.push_str(single);
                doc.push(' ');
            }
            _ => {}
        }
        let params: Vec<String> = self.parameters.iter().map(|(n, t)| format!("{} {}", t, n)).collect();
        doc.push_str(&format!("{}({})", self.name, params.join(", ")));
        if self.returns.len() > 1 {
            doc.push_str("\nreturning ");
            doc.push_str(&self.returns.join(", "));
        }
        if !self.documentation.is_empty() {
            doc.push_str("\n\n");
            doc.push_str(&self.documentation);
        }
        doc
    }
}
