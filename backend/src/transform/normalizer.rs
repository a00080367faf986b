//! Many-to-many decomposition of multi-valued fact columns.
//!
//! A fact column holding a list per row becomes two tables:
//!
//! ```text
//! apps.genre                     genres                apps_genres
//! ┌────┬──────────────────┐      ┌──────────┬────────┐  ┌────────┬──────────┐
//! │ 10 │ [Action, Indie]  │  →   │ id_genre │ genre  │  │ id_app │ id_genre │
//! │ 20 │ [Indie]          │      │ 0        │ Action │  │ 10     │ 0        │
//! └────┴──────────────────┘      │ 1        │ Indie  │  │ 10     │ 1        │
//!                                └──────────┴────────┘  │ 20     │ 1        │
//!                                                       └────────┴──────────┘
//! ```
//!
//! Dimension ids start at 0 and follow first appearance, so identical input
//! always yields identical ids.

use std::collections::HashMap;

use serde::Serialize;

/// Stringified missing value. Never becomes a dimension row.
pub const NULL_MARKER: &str = "nan";

/// Names used when a column is decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Id column of the fact table, e.g. `id_app`.
    pub fact_id_column: &'static str,
    /// Multi-valued column being removed from the fact table, e.g. `genre`.
    pub list_column: &'static str,
    /// Dimension table name, e.g. `genres`.
    pub dimension_table: &'static str,
    /// Synthetic key of the dimension, e.g. `id_genre`.
    pub dimension_id_column: &'static str,
    /// Value column of the dimension, e.g. `genre`.
    pub value_column: &'static str,
    /// Junction table name, e.g. `apps_genres`.
    pub junction_table: &'static str,
}

/// One distinct value with its synthetic id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionRow {
    pub id: usize,
    pub value: String,
}

/// An extra column computed from the dimension values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedColumn {
    pub name: String,
    /// Parallel to [`Dimension::rows`].
    pub values: Vec<String>,
}

/// A dimension table: distinct values of one decomposed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub spec: ColumnSpec,
    pub rows: Vec<DimensionRow>,
    pub derived: Vec<DerivedColumn>,
}

impl Dimension {
    fn new(spec: ColumnSpec) -> Self {
        Self {
            spec,
            rows: Vec::new(),
            derived: Vec::new(),
        }
    }

    /// Return the id for `value`, assigning the next one if unseen.
    fn intern(&mut self, index: &mut HashMap<String, usize>, value: &str) -> usize {
        if let Some(&id) = index.get(value) {
            return id;
        }
        let id = self.rows.len();
        index.insert(value.to_string(), id);
        self.rows.push(DimensionRow {
            id,
            value: value.to_string(),
        });
        id
    }

    /// Add a column computed from each value, like `languages.normalized_language`.
    pub fn derive(&mut self, name: impl Into<String>, f: impl Fn(&str) -> String) {
        let values = self.rows.iter().map(|row| f(&row.value)).collect();
        self.derived.push(DerivedColumn {
            name: name.into(),
            values,
        });
    }

    /// Look up the id of a value.
    pub fn id_of(&self, value: &str) -> Option<usize> {
        self.rows.iter().find(|row| row.value == value).map(|row| row.id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Link between a fact row and a dimension row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub fact_id: i64,
    pub dimension_id: usize,
}

/// Link carrying a weight from the source mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightedLink {
    pub fact_id: i64,
    pub dimension_id: usize,
    pub count: i64,
}

/// A junction table between the fact table and one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction<L> {
    pub spec: ColumnSpec,
    pub rows: Vec<L>,
}

impl<L> Junction<L> {
    fn new(spec: ColumnSpec) -> Self {
        Self {
            spec,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Move a multi-valued column out of every fact row.
///
/// This is the "drop the column" half of a decomposition: afterwards each
/// row's column is empty and the values live in the returned pairs.
pub fn take_column<R, T>(
    facts: &mut [R],
    fact_id: impl Fn(&R) -> i64,
    column: impl Fn(&mut R) -> &mut Vec<T>,
) -> Vec<(i64, Vec<T>)> {
    facts
        .iter_mut()
        .map(|row| {
            let id = fact_id(row);
            (id, std::mem::take(column(row)))
        })
        .collect()
}

/// Decompose a list-of-strings column.
///
/// Values are compared trimmed and case-sensitively. [`NULL_MARKER`] and
/// empty values are skipped in both tables. A row with an empty list
/// contributes no links.
pub fn normalize_list_column(
    exploded: Vec<(i64, Vec<String>)>,
    spec: ColumnSpec,
) -> (Dimension, Junction<Link>) {
    let mut dimension = Dimension::new(spec);
    let mut junction = Junction::new(spec);
    let mut index = HashMap::new();

    for (fact_id, values) in exploded {
        for value in values {
            let value = value.trim();
            if value.is_empty() || value == NULL_MARKER {
                continue;
            }
            let dimension_id = dimension.intern(&mut index, value);
            junction.rows.push(Link {
                fact_id,
                dimension_id,
            });
        }
    }

    (dimension, junction)
}

/// Decompose a list-of-`(value, count)` column.
///
/// The dimension keys on the value; the count rides on the junction row
/// unchanged. A value repeated for the same fact yields one link per
/// occurrence. Values are not trimmed; [`NULL_MARKER`] and empty values are
/// skipped in both tables.
pub fn normalize_json_column(
    exploded: Vec<(i64, Vec<(String, i64)>)>,
    spec: ColumnSpec,
) -> (Dimension, Junction<WeightedLink>) {
    let mut dimension = Dimension::new(spec);
    let mut junction = Junction::new(spec);
    let mut index = HashMap::new();

    for (fact_id, pairs) in exploded {
        for (value, count) in pairs {
            if value.is_empty() || value == NULL_MARKER {
                continue;
            }
            let dimension_id = dimension.intern(&mut index, &value);
            junction.rows.push(WeightedLink {
                fact_id,
                dimension_id,
                count,
            });
        }
    }

    (dimension, junction)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENRES: ColumnSpec = ColumnSpec {
        fact_id_column: "id_app",
        list_column: "genre",
        dimension_table: "genres",
        dimension_id_column: "id_genre",
        value_column: "genre",
        junction_table: "apps_genres",
    };

    const TAGS: ColumnSpec = ColumnSpec {
        fact_id_column: "id_app",
        list_column: "tags",
        dimension_table: "tags",
        dimension_id_column: "id_tag",
        value_column: "tag",
        junction_table: "apps_tags",
    };

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn genre_input() -> Vec<(i64, Vec<String>)> {
        vec![
            (10, strings(&["Action", " Indie"])),
            (20, strings(&["Indie ", "nan"])),
            (30, vec![]),
            (40, strings(&["RPG", "Action"])),
        ]
    }

    #[test]
    fn test_list_dimension_first_appearance() {
        let (dimension, _) = normalize_list_column(genre_input(), GENRES);

        let values: Vec<&str> = dimension.rows.iter().map(|r| r.value.as_str()).collect();
        let ids: Vec<usize> = dimension.rows.iter().map(|r| r.id).collect();
        assert_eq!(values, vec!["Action", "Indie", "RPG"]);
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_list_junction_links() {
        let (_, junction) = normalize_list_column(genre_input(), GENRES);

        let links: Vec<(i64, usize)> = junction
            .rows
            .iter()
            .map(|l| (l.fact_id, l.dimension_id))
            .collect();
        assert_eq!(links, vec![(10, 0), (10, 1), (20, 1), (40, 2), (40, 0)]);
    }

    #[test]
    fn test_list_is_case_sensitive() {
        let input = vec![(1, strings(&["indie", "Indie"]))];
        let (dimension, junction) = normalize_list_column(input, GENRES);

        assert_eq!(dimension.len(), 2);
        assert_eq!(junction.len(), 2);
    }

    #[test]
    fn test_list_only_markers_gives_empty_tables() {
        let input = vec![(1, strings(&["nan"])), (2, strings(&["", " "]))];
        let (dimension, junction) = normalize_list_column(input, GENRES);

        assert!(dimension.is_empty());
        assert!(junction.is_empty());
    }

    #[test]
    fn test_list_rerun_is_identical() {
        let first = normalize_list_column(genre_input(), GENRES);
        let second = normalize_list_column(genre_input(), GENRES);
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_column_carries_counts() {
        let input = vec![
            (10, vec![("Indie".to_string(), 10), ("Action".to_string(), 4)]),
            (20, vec![]),
            (30, vec![("Action".to_string(), 99)]),
        ];
        let (dimension, junction) = normalize_json_column(input, TAGS);

        assert_eq!(dimension.id_of("Indie"), Some(0));
        assert_eq!(dimension.id_of("Action"), Some(1));
        assert_eq!(
            junction.rows,
            vec![
                WeightedLink { fact_id: 10, dimension_id: 0, count: 10 },
                WeightedLink { fact_id: 10, dimension_id: 1, count: 4 },
                WeightedLink { fact_id: 30, dimension_id: 1, count: 99 },
            ]
        );
    }

    #[test]
    fn test_json_column_skips_markers() {
        let input = vec![(
            10,
            vec![
                (String::new(), 3),
                ("nan".to_string(), 4),
                (" Indie ".to_string(), 5),
                ("Indie".to_string(), 6),
            ],
        )];
        let (dimension, junction) = normalize_json_column(input, TAGS);

        let values: Vec<&str> = dimension.rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec![" Indie ", "Indie"]);
        let counts: Vec<i64> = junction.rows.iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![5, 6]);
    }

    #[test]
    fn test_json_column_repeated_value_passes_through() {
        let input = vec![(10, vec![("FPS".to_string(), 1), ("FPS".to_string(), 2)])];
        let (dimension, junction) = normalize_json_column(input, TAGS);

        assert_eq!(dimension.len(), 1);
        let counts: Vec<i64> = junction.rows.iter().map(|l| l.count).collect();
        assert_eq!(counts, vec![1, 2]);
    }

    #[test]
    fn test_take_column_empties_source() {
        struct Row {
            id: i64,
            genres: Vec<String>,
        }
        let mut facts = vec![
            Row { id: 1, genres: strings(&["A"]) },
            Row { id: 2, genres: strings(&["B", "C"]) },
        ];

        let taken = take_column(&mut facts, |r| r.id, |r| &mut r.genres);

        assert_eq!(taken, vec![(1, strings(&["A"])), (2, strings(&["B", "C"]))]);
        assert!(facts.iter().all(|r| r.genres.is_empty()));
    }

    #[test]
    fn test_derive_column() {
        let input = vec![(1, strings(&["Spanish - Spain", "English"]))];
        let (mut dimension, _) = normalize_list_column(input, GENRES);
        dimension.derive("upper", |v| v.to_uppercase());

        assert_eq!(dimension.derived[0].name, "upper");
        assert_eq!(dimension.derived[0].values, vec!["SPANISH - SPAIN", "ENGLISH"]);
    }
}
