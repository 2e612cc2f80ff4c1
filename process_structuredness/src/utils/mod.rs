//! Utilities shared by the test suites
#[cfg(test)]
pub mod test_utils {
    use std::path::PathBuf;

    use crate::core::{io::Importable, relations::RelationMatrix};

    pub fn get_test_data_path() -> PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("test_data")
    }

    /// All relation matrices of `test_data/classification`, sorted by file name
    pub fn classification_fixtures() -> Vec<(String, RelationMatrix)> {
        let dir = get_test_data_path().join("classification");
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        paths.sort();
        paths
            .into_iter()
            .map(|p| {
                let name = p.file_stem().unwrap().to_string_lossy().to_string();
                (name, RelationMatrix::import_from_path(&p).unwrap())
            })
            .collect()
    }

    /// Build a [`RelationMatrix`] from forward relations, panicking on invalid input
    pub fn matrix(activities: &[&str], pairs: &[(&str, &str, &str)]) -> RelationMatrix {
        RelationMatrix::from_pairs(activities.iter().copied(), pairs.iter().copied()).unwrap()
    }

    /// Index of an activity label in `matrix`
    pub fn idx(matrix: &RelationMatrix, activity: &str) -> usize {
        matrix.index_of(activity).unwrap()
    }

    /// XOR between `c` and the parallel `d`/`e`, preceded by the sequence `a`, `b` and merged at `f`
    pub fn log01() -> RelationMatrix {
        matrix(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b", "<d,<=>"),
                ("a", "c", "<,<="),
                ("a", "d", "<,<="),
                ("a", "e", "<,<="),
                ("a", "f", "<,<=>"),
                ("b", "c", "<d,<="),
                ("b", "d", "<d,<="),
                ("b", "e", "<d,<="),
                ("b", "f", "<,<=>"),
                ("c", "d", "-,</=>"),
                ("c", "e", "-,</=>"),
                ("c", "f", "<d,=>"),
                ("d", "e", "-,<=>"),
                ("d", "f", "<,=>"),
                ("e", "f", "<,=>"),
            ],
        )
    }
}
