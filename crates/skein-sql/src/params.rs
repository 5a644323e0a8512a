use skein_core::{driver::Param, stmt::Value};

/// Parameters of one command, in the order their placeholders are emitted.
#[derive(Debug, Default)]
pub struct Params {
    params: Vec<Param>,

    /// Next anonymous ordinal
    ordinal: usize,

    /// `_m{index}` inside a multi-statement batch
    command_suffix: String,

    /// Bulk row being rendered
    row: Option<usize>,
}

impl Params {
    pub fn new(command_suffix: impl Into<String>) -> Params {
        Params {
            command_suffix: command_suffix.into(),
            ..Params::default()
        }
    }

    /// Continues the anonymous ordinals of an earlier command, so commands
    /// of one batch never reuse a name.
    pub(crate) fn continue_from(mut self, ordinal: usize) -> Params {
        self.ordinal = ordinal;
        self
    }

    pub(crate) fn next_ordinal(&self) -> usize {
        self.ordinal
    }

    /// Binds a constant under the next `p{ordinal}` name and returns the
    /// name.
    pub fn push_anonymous(&mut self, value: Value) -> String {
        let base = format!("p{}", self.ordinal);
        self.ordinal += 1;
        self.push(base, value)
    }

    /// Binds a member value or variable under its own name, suffixed for the
    /// batch and bulk row, and returns the final name.
    pub fn push_named(&mut self, name: &str, value: Value) -> String {
        self.push(name.to_string(), value)
    }

    fn push(&mut self, mut name: String, value: Value) -> String {
        name.push_str(&self.command_suffix);
        if let Some(row) = self.row {
            name.push_str(&format!("_{row}"));
        }

        if self.contains(&name) {
            let base = name;
            let mut n = 1;
            name = format!("{base}_{n}");
            while self.contains(&name) {
                n += 1;
                name = format!("{base}_{n}");
            }
        }

        self.params.push(Param {
            name: name.clone(),
            value,
        });
        name
    }

    fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|param| param.name == name)
    }

    pub(crate) fn set_row(&mut self, row: Option<usize>) {
        self.row = row;
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn into_vec(self) -> Vec<Param> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_names_count_up() {
        let mut params = Params::default();
        assert_eq!(params.push_anonymous(Value::I32(1)), "p0");
        assert_eq!(params.push_anonymous(Value::I32(2)), "p1");
    }

    #[test]
    fn batch_and_row_suffixes() {
        let mut params = Params::new("_m2");
        params.set_row(Some(4));
        assert_eq!(params.push_named("name", Value::from("x")), "name_m2_4");
        assert_eq!(params.push_anonymous(Value::Null), "p0_m2_4");
    }

    #[test]
    fn colliding_names_are_disambiguated() {
        let mut params = Params::default();
        assert_eq!(params.push_named("age", Value::I32(1)), "age");
        assert_eq!(params.push_named("age", Value::I32(2)), "age_1");
        assert_eq!(params.push_named("age", Value::I32(3)), "age_2");
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["age", "age_1", "age_2"]);
    }
}
