//! Grid reference datasets and the index lookup helper.

use crate::collection::SubjectCollection;
use crate::model::sample::{Sample, SampleName};
use crate::model::subject::Subject;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One row of the subjects reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDescriptor {
    #[serde(rename = "absolutePath")]
    pub absolute_path: String,
    #[serde(rename = "childCount", default)]
    pub child_count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubjectDescriptor {
    pub fn new(absolute_path: impl Into<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            child_count: 0,
            extra: Map::new(),
        }
    }
}

/// Subjects dataset shapes: the hierarchy root with `children`, or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum SubjectsDataset {
    Root { children: Vec<SubjectDescriptor> },
    Flat(Vec<SubjectDescriptor>),
}

/// Errors while loading reference datasets.
#[derive(Debug)]
pub enum LayoutError {
    Parse {
        dataset: &'static str,
        source: serde_json::Error,
    },
}

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse { dataset, source } => {
                write!(f, "invalid {dataset} reference dataset: {source}")
            }
        }
    }
}

impl Error for LayoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Grid cell address: `row` indexes subjects, `column` indexes aspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

impl CellRef {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Grid coordinates of one subject and each of its samples.
///
/// `sample_indexes` runs from the subject's last sample to its first; hosts
/// walk it backwards to visit samples in list order. Serialized form uses
/// `-1` for positions that were not found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GridIndex {
    pub subject_index: Option<usize>,
    pub sample_indexes: Vec<Option<usize>>,
}

impl GridIndex {
    /// Sentinel used by the host for "not found".
    pub const NOT_FOUND: i64 = -1;

    pub fn subject_sentinel(&self) -> i64 {
        sentinel(self.subject_index)
    }

    pub fn sample_sentinels(&self) -> Vec<i64> {
        self.sample_indexes.iter().copied().map(sentinel).collect()
    }

    /// Cells addressable on the grid; empty when the row is unknown.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        let row = self.subject_index;
        self.sample_indexes
            .iter()
            .filter_map(move |column| Some(CellRef::new(row?, (*column)?)))
    }
}

impl Serialize for GridIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GridIndex", 2)?;
        state.serialize_field("subjectIndex", &self.subject_sentinel())?;
        state.serialize_field("sampleIndexes", &self.sample_sentinels())?;
        state.end()
    }
}

fn sentinel(position: Option<usize>) -> i64 {
    position
        .and_then(|value| i64::try_from(value).ok())
        .unwrap_or(GridIndex::NOT_FOUND)
}

/// Placement of a whole collection on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Placement {
    pub placed: Vec<CellRef>,
    /// Samples whose row or column is not part of the layout.
    pub unplaced: Vec<SampleName>,
}

/// Static row/column layout of the lens grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLayout {
    subjects: Vec<SubjectDescriptor>,
    aspects: Vec<String>,
}

impl GridLayout {
    pub fn new(subjects: Vec<SubjectDescriptor>, aspects: Vec<String>) -> Self {
        Self { subjects, aspects }
    }

    /// Loads both reference datasets from their JSON documents.
    ///
    /// `subjects_json` is either `{ "children": [...] }` or a bare array;
    /// `aspects_json` is an array of aspect names.
    pub fn from_json(subjects_json: &str, aspects_json: &str) -> Result<Self, LayoutError> {
        let subjects = match serde_json::from_str::<SubjectsDataset>(subjects_json) {
            Ok(SubjectsDataset::Root { children }) => children,
            Ok(SubjectsDataset::Flat(children)) => children,
            Err(source) => {
                return Err(LayoutError::Parse {
                    dataset: "subjects",
                    source,
                })
            }
        };
        let aspects = serde_json::from_str::<Vec<String>>(aspects_json).map_err(|source| {
            LayoutError::Parse {
                dataset: "aspects",
                source,
            }
        })?;
        Ok(Self::new(subjects, aspects))
    }

    pub fn subjects(&self) -> &[SubjectDescriptor] {
        &self.subjects
    }

    pub fn aspects(&self) -> &[String] {
        &self.aspects
    }

    pub fn rows(&self) -> usize {
        self.subjects.len()
    }

    pub fn columns(&self) -> usize {
        self.aspects.len()
    }

    /// Row of `absolute_path`; the last one when the dataset repeats a path.
    pub fn subject_row(&self, absolute_path: &str) -> Option<usize> {
        self.subjects
            .iter()
            .rposition(|descriptor| descriptor.absolute_path == absolute_path)
    }

    /// Column of `aspect_name`; the first one when the dataset repeats it.
    pub fn aspect_column(&self, aspect_name: &str) -> Option<usize> {
        self.aspects.iter().position(|aspect| aspect == aspect_name)
    }

    /// Computes the grid coordinates of `subject` and its samples.
    ///
    /// Sample columns come back last sample first.
    pub fn locate(&self, subject: &Subject) -> GridIndex {
        GridIndex {
            subject_index: self.subject_row(&subject.absolute_path),
            sample_indexes: subject
                .samples
                .iter()
                .rev()
                .map(|sample| self.sample_column(sample))
                .collect(),
        }
    }

    fn sample_column(&self, sample: &Sample) -> Option<usize> {
        sample
            .aspect_name()
            .and_then(|aspect| self.aspect_column(aspect))
    }

    /// Places every sample of `subjects` on the grid.
    pub fn place(&self, subjects: &SubjectCollection) -> Placement {
        let mut placement = Placement::default();
        for subject in subjects {
            let row = self.subject_row(&subject.absolute_path);
            for sample in &subject.samples {
                match (row, self.sample_column(sample)) {
                    (Some(row), Some(column)) => placement.placed.push(CellRef::new(row, column)),
                    _ => placement.unplaced.push(sample.name.clone()),
                }
            }
        }
        placement
    }
}
