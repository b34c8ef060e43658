//! Column-major categorical datasets, row subsets, and row lookup.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::error::TreeError;

/// Zero-based attribute (column) index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct AttributeIndex(usize);

impl AttributeIndex {
    /// Create a new attribute index from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One dictionary-encoded categorical column.
#[derive(Debug, Clone)]
struct Column {
    name: String,
    /// Distinct values in first-appearance order.
    levels: Vec<String>,
    /// `codes[row]` indexes into `levels`.
    codes: Vec<usize>,
}

/// An immutable table of categorical attributes.
///
/// Values are stored column-major and dictionary-encoded: each column keeps
/// its distinct values in first-appearance order plus one level code per row.
/// Induction works on [`Subset`]s, which are row-index lists into this table.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from a header and row-major string values.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::NoColumns`] | `header` is empty |
    /// | [`TreeError::EmptyAttributeName`] | a header entry is empty |
    /// | [`TreeError::DuplicateAttribute`] | two header entries are equal |
    /// | [`TreeError::EmptyDataset`] | `rows` is empty |
    /// | [`TreeError::RowLengthMismatch`] | a row's width differs from the header |
    pub fn from_rows<S, R>(header: &[S], rows: &[R]) -> Result<Self, TreeError>
    where
        S: AsRef<str>,
        R: AsRef<[S]>,
    {
        if header.is_empty() {
            return Err(TreeError::NoColumns);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (column, name) in header.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() {
                return Err(TreeError::EmptyAttributeName { column });
            }
            if let Some(&first) = seen.get(name) {
                return Err(TreeError::DuplicateAttribute {
                    name: name.to_string(),
                    first,
                    second: column,
                });
            }
            seen.insert(name, column);
        }

        if rows.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        let mut columns: Vec<Column> = header
            .iter()
            .map(|name| Column {
                name: name.as_ref().to_string(),
                levels: Vec::new(),
                codes: Vec::with_capacity(rows.len()),
            })
            .collect();
        let mut lookups: Vec<HashMap<String, usize>> = vec![HashMap::new(); header.len()];

        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != header.len() {
                return Err(TreeError::RowLengthMismatch {
                    row_index,
                    expected: header.len(),
                    got: row.len(),
                });
            }
            for ((column, lookup), value) in columns.iter_mut().zip(&mut lookups).zip(row) {
                let value = value.as_ref();
                let code = match lookup.get(value) {
                    Some(&code) => code,
                    None => {
                        let code = column.levels.len();
                        column.levels.push(value.to_string());
                        lookup.insert(value.to_string(), code);
                        code
                    }
                };
                column.codes.push(code);
            }
        }

        Ok(Self {
            columns,
            n_rows: rows.len(),
        })
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Return the number of attributes (columns), target included.
    #[must_use]
    pub fn n_attributes(&self) -> usize {
        self.columns.len()
    }

    /// Return the attribute names in column order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Look up an attribute by name.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownAttribute`] if no column has that name.
    pub fn attribute_index(&self, name: &str) -> Result<AttributeIndex, TreeError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(AttributeIndex::new)
            .ok_or_else(|| TreeError::UnknownAttribute {
                name: name.to_string(),
            })
    }

    /// Return the name of an attribute.
    ///
    /// # Panics
    ///
    /// Panics if `attribute` does not belong to this dataset.
    #[must_use]
    pub fn attribute_name(&self, attribute: AttributeIndex) -> &str {
        &self.columns[attribute.index()].name
    }

    /// Return the distinct values of an attribute in first-appearance order.
    #[must_use]
    pub fn levels(&self, attribute: AttributeIndex) -> &[String] {
        &self.columns[attribute.index()].levels
    }

    /// Return the value of `attribute` in row `row`.
    #[must_use]
    pub fn value(&self, row: usize, attribute: AttributeIndex) -> &str {
        let column = &self.columns[attribute.index()];
        &column.levels[column.codes[row]]
    }

    /// Return the level code of `attribute` in row `row`.
    pub(crate) fn code(&self, row: usize, attribute: AttributeIndex) -> usize {
        self.columns[attribute.index()].codes[row]
    }

    /// Return every attribute except `target`, in column order.
    #[must_use]
    pub fn attributes_except(&self, target: AttributeIndex) -> Vec<AttributeIndex> {
        (0..self.columns.len())
            .map(AttributeIndex::new)
            .filter(|&a| a != target)
            .collect()
    }

    /// Return a row view usable with [`DecisionTree::classify`](crate::DecisionTree::classify).
    #[must_use]
    pub fn row(&self, index: usize) -> DatasetRow<'_> {
        DatasetRow { data: self, index }
    }

    /// Iterate over all rows in order.
    pub fn rows(&self) -> impl Iterator<Item = DatasetRow<'_>> {
        (0..self.n_rows).map(|index| self.row(index))
    }
}

/// A borrowed view of some rows of a [`Dataset`].
///
/// Holds a reference to the shared table plus its own list of row indices,
/// so partitioning never copies row data.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    data: &'a Dataset,
    rows: Vec<usize>,
}

impl<'a> Subset<'a> {
    /// A subset containing every row of `data`.
    #[must_use]
    pub fn full(data: &'a Dataset) -> Self {
        Self {
            data,
            rows: (0..data.n_rows()).collect(),
        }
    }

    /// A subset of the given row indices.
    ///
    /// # Panics
    ///
    /// Debug builds panic if an index is out of range.
    #[must_use]
    pub fn from_indices(data: &'a Dataset, rows: Vec<usize>) -> Self {
        debug_assert!(rows.iter().all(|&r| r < data.n_rows()), "row index out of range");
        Self { data, rows }
    }

    /// Return the backing dataset.
    #[must_use]
    pub fn dataset(&self) -> &'a Dataset {
        self.data
    }

    /// Return the row indices of this subset.
    #[must_use]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Return the number of rows in this subset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if the subset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count rows per level of `attribute`, indexed by level code.
    ///
    /// The result covers every level of the whole dataset, so unobserved
    /// values appear with a count of zero.
    #[must_use]
    pub fn value_counts(&self, attribute: AttributeIndex) -> Vec<usize> {
        let mut counts = vec![0usize; self.data.levels(attribute).len()];
        for &row in &self.rows {
            counts[self.data.code(row, attribute)] += 1;
        }
        counts
    }

    /// Return how many distinct values `attribute` takes in this subset.
    #[must_use]
    pub fn distinct_count(&self, attribute: AttributeIndex) -> usize {
        self.value_counts(attribute).iter().filter(|&&c| c > 0).count()
    }

    /// Split the subset by equality on `attribute`.
    ///
    /// Returns one `(level code, subset)` pair per distinct value present,
    /// in the order the values first appear among this subset's rows.
    #[must_use]
    pub fn partition(&self, attribute: AttributeIndex) -> Vec<(usize, Subset<'a>)> {
        let mut slot: Vec<Option<usize>> = vec![None; self.data.levels(attribute).len()];
        let mut groups: Vec<(usize, Subset<'a>)> = Vec::new();
        for &row in &self.rows {
            let code = self.data.code(row, attribute);
            let group = match slot[code] {
                Some(group) => group,
                None => {
                    groups.push((
                        code,
                        Subset {
                            data: self.data,
                            rows: Vec::new(),
                        },
                    ));
                    slot[code] = Some(groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[group].1.rows.push(row);
        }
        groups
    }
}

/// Anything that can produce a categorical value for an attribute name.
///
/// Implemented for string maps and for [`DatasetRow`], so both ad-hoc
/// records and rows of a loaded dataset can be classified.
pub trait Row {
    /// Return the value of `attribute`, or `None` if the row lacks it.
    fn value(&self, attribute: &str) -> Option<&str>;
}

impl<K, V, S> Row for HashMap<K, V, S>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn value(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).map(AsRef::as_ref)
    }
}

impl<K, V> Row for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn value(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).map(AsRef::as_ref)
    }
}

/// A single row of a [`Dataset`].
#[derive(Debug, Clone, Copy)]
pub struct DatasetRow<'a> {
    data: &'a Dataset,
    index: usize,
}

impl<'a> DatasetRow<'a> {
    /// Return the zero-based row index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Return the value of `attribute` in this row.
    #[must_use]
    pub fn get(&self, attribute: AttributeIndex) -> &'a str {
        self.data.value(self.index, attribute)
    }
}

impl Row for DatasetRow<'_> {
    fn value(&self, attribute: &str) -> Option<&str> {
        self.data
            .attribute_index(attribute)
            .ok()
            .map(|a| self.data.value(self.index, a))
    }
}
