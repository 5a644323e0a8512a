macro_rules! fmt {
    ($dst:expr, $( $fragments:expr )*) => {{
        $(
            $crate::fmt::ToSql::to_sql($fragments, $dst);
        )*
    }};
}

pub(crate) trait ToSql {
    fn to_sql(self, dst: &mut String);
}

impl ToSql for &str {
    fn to_sql(self, dst: &mut String) {
        dst.push_str(self);
    }
}

impl ToSql for &String {
    fn to_sql(self, dst: &mut String) {
        dst.push_str(self);
    }
}

impl ToSql for String {
    fn to_sql(self, dst: &mut String) {
        dst.push_str(&self);
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(self, dst: &mut String) {
        if let Some(fragment) = self {
            fragment.to_sql(dst);
        }
    }
}

/// Comma delimited, without padding
pub(crate) struct Comma<L>(pub(crate) L);

/// Delimited by an arbitrary separator
pub(crate) struct Delimited<L>(pub(crate) L, pub(crate) &'static str);

impl<L> ToSql for Comma<L>
where
    L: IntoIterator,
    L::Item: ToSql,
{
    fn to_sql(self, dst: &mut String) {
        Delimited(self.0, ",").to_sql(dst)
    }
}

impl<L> ToSql for Delimited<L>
where
    L: IntoIterator,
    L::Item: ToSql,
{
    fn to_sql(self, dst: &mut String) {
        let mut s = "";
        for i in self.0 {
            fmt!(dst, s i);
            s = self.1;
        }
    }
}
