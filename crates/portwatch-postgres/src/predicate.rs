use chrono::{DateTime, Utc};
use tokio_postgres::types::ToSql;

/// Incrementally builds a parameterized WHERE clause. Column names come from
/// the fixed repository queries; every caller-supplied value binds as a
/// numbered parameter, never as interpolated text.
#[derive(Default)]
pub struct PredicateBuilder {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql + Send + Sync>>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bind<T>(&mut self, value: T) -> usize
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.params.push(Box::new(value));
        self.params.len()
    }

    pub fn eq<T>(&mut self, column: &str, value: T)
    where
        T: ToSql + Send + Sync + 'static,
    {
        let n = self.bind(value);
        self.clauses.push(format!("{column} = ${n}"));
    }

    /// Case-insensitive substring match. LIKE metacharacters in the needle are
    /// escaped so they match literally.
    pub fn contains_ci(&mut self, column: &str, needle: &str) {
        let pattern = format!("%{}%", escape_like(needle));
        let n = self.bind(pattern);
        self.clauses.push(format!("{column} ILIKE ${n} ESCAPE '\\'"));
    }

    pub fn gte(&mut self, column: &str, value: DateTime<Utc>) {
        let n = self.bind(value);
        self.clauses.push(format!("{column} >= ${n}"));
    }

    pub fn lte(&mut self, column: &str, value: DateTime<Utc>) {
        let n = self.bind(value);
        self.clauses.push(format!("{column} <= ${n}"));
    }

    pub fn between_f64(&mut self, column: &str, low: f64, high: f64) {
        let n_low = self.bind(low);
        let n_high = self.bind(high);
        self.clauses
            .push(format!("{column} BETWEEN ${n_low} AND ${n_high}"));
    }

    /// Binds an extra parameter outside the WHERE clause, e.g. a LIMIT value.
    /// Returns the placeholder number.
    pub fn bind_extra<T>(&mut self, value: T) -> usize
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.bind(value)
    }

    /// The WHERE clause with a leading space, or an empty string when no
    /// predicate was added.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect()
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_produces_no_where_clause() {
        let builder = PredicateBuilder::new();
        assert_eq!(builder.where_sql(), "");
        assert!(builder.params().is_empty());
    }

    #[test]
    fn clauses_number_parameters_in_order() {
        let mut builder = PredicateBuilder::new();
        builder.eq("dataset", "MODIS_LST".to_string());
        builder.gte("ts", Utc::now());
        builder.between_f64("latitude", -11.65, -11.50);
        assert_eq!(
            builder.where_sql(),
            " WHERE dataset = $1 AND ts >= $2 AND latitude BETWEEN $3 AND $4"
        );
        assert_eq!(builder.params().len(), 4);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("100%_temp\\x"), "100\\%\\_temp\\\\x");
    }

    #[test]
    fn extra_binding_continues_numbering() {
        let mut builder = PredicateBuilder::new();
        builder.eq("sensor_id", "harbor_temp".to_string());
        let n = builder.bind_extra(100i64);
        assert_eq!(n, 2);
        assert_eq!(builder.params().len(), 2);
    }
}
