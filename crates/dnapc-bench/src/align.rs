use crate::errors::{BenchError, BenchResult};
use crate::names::{extract_name, FileIdentity};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Base names present in every listing, sorted.
pub fn common_names(listings: &[Vec<PathBuf>]) -> BenchResult<BTreeSet<String>> {
    check_listings(listings)?;

    let mut sets = listings
        .iter()
        .map(|listing| listing.iter().map(extract_name).collect::<BTreeSet<_>>());

    // check_listings guarantees at least one listing
    let first = sets.next().unwrap_or_default();
    Ok(sets.fold(first, |common, names| {
        common.intersection(&names).cloned().collect()
    }))
}

/// Align N directory listings on their shared base names.
///
/// Each output list holds one path per common name, rebuilt from the
/// directory and extension of the listing's first entry, so `out[i][k]` and
/// `out[j][k]` always refer to the same record. Names missing from any
/// listing are dropped without warning.
pub fn align_files(listings: &[Vec<PathBuf>]) -> BenchResult<Vec<Vec<PathBuf>>> {
    let common = common_names(listings)?;

    let aligned: Vec<Vec<PathBuf>> = listings
        .iter()
        .map(|listing| {
            // directories are assumed to hold a single extension
            let representative = FileIdentity::from_path(&listing[0]);
            common
                .iter()
                .map(|name| representative.renamed(name))
                .collect()
        })
        .collect();

    let largest = listings.iter().map(Vec::len).max().unwrap_or(0);
    tracing::debug!(
        directories = listings.len(),
        common = common.len(),
        dropped = largest - common.len(),
        "aligned directory listings"
    );

    Ok(aligned)
}

/// Transpose N aligned lists into one group of N paths per record.
pub fn zip_aligned(aligned: Vec<Vec<PathBuf>>) -> Vec<Vec<PathBuf>> {
    let len = aligned.first().map(Vec::len).unwrap_or(0);
    let mut columns: Vec<_> = aligned.into_iter().map(Vec::into_iter).collect();
    (0..len)
        .map(|_| columns.iter_mut().filter_map(Iterator::next).collect())
        .collect()
}

fn check_listings(listings: &[Vec<PathBuf>]) -> BenchResult<()> {
    if listings.is_empty() {
        return Err(BenchError::AlignmentError(
            "Need at least 1 directory to align".to_string(),
        ));
    }
    if let Some(position) = listings.iter().position(Vec::is_empty) {
        return Err(BenchError::AlignmentError(format!(
            "Need at least 1 element in each directory, listing {} is empty",
            position
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(paths: &[&str]) -> Vec<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_drops_names_missing_anywhere() {
        let x = listing(&["x/a.npy", "x/b.npy", "x/c.npy"]);
        let y = listing(&["y/b.pkl", "y/a.pkl"]);
        let x_hat = listing(&["x_hat/a.ply", "x_hat/b.ply"]);

        let aligned = align_files(&[x, y, x_hat]).unwrap();
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0], listing(&["x/a.npy", "x/b.npy"]));
        assert_eq!(aligned[1], listing(&["y/a.pkl", "y/b.pkl"]));
        assert_eq!(aligned[2], listing(&["x_hat/a.ply", "x_hat/b.ply"]));
    }

    #[test]
    fn test_positions_share_names() {
        let x = listing(&["x/q.npy", "x/m.npy", "x/z.npy", "x/k.npy"]);
        let y = listing(&["y/z.npy", "y/k.npy", "y/q.npy"]);

        let aligned = align_files(&[x, y]).unwrap();
        for (a, b) in aligned[0].iter().zip(&aligned[1]) {
            assert_eq!(extract_name(a), extract_name(b));
        }
        assert_eq!(aligned[0].len(), 3);
    }

    #[test]
    fn test_disjoint_listings_align_to_nothing() {
        let aligned = align_files(&[listing(&["x/a.npy"]), listing(&["y/b.npy"])]).unwrap();
        assert!(aligned.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            align_files(&[]),
            Err(BenchError::AlignmentError(_))
        ));
        assert!(matches!(
            align_files(&[listing(&["x/a.npy"]), Vec::new()]),
            Err(BenchError::AlignmentError(_))
        ));
    }

    #[test]
    fn test_zip_aligned() {
        let groups = zip_aligned(vec![
            listing(&["x/a.npy", "x/b.npy"]),
            listing(&["y/a.npy", "y/b.npy"]),
        ]);
        assert_eq!(
            groups,
            vec![
                listing(&["x/a.npy", "y/a.npy"]),
                listing(&["x/b.npy", "y/b.npy"]),
            ]
        );
        assert_eq!(
            zip_aligned(vec![listing(&["x/a.npy"])]),
            vec![listing(&["x/a.npy"])]
        );
    }
}
