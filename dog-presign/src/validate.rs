use crate::{FileBlob, TransferError, TransferResult};

/// Checks applied to a blob before any hashing or backend call.
///
/// Order matters: emptiness, then size, then filename.
pub fn validate_blob(blob: &FileBlob, max_file_bytes: u64) -> TransferResult<()> {
    if blob.is_empty() {
        return Err(TransferError::EmptyFile);
    }

    if blob.size() > max_file_bytes {
        return Err(TransferError::FileTooLarge {
            max_bytes: max_file_bytes,
        });
    }

    let file_name = blob.file_name.as_deref().unwrap_or_default();
    if !is_file_name_valid(file_name) {
        return Err(TransferError::invalid_file_name(file_name));
    }

    Ok(())
}

/// A filename needs at least one letter before its extension.
///
/// Directory components are ignored; without a `.` the whole name counts as
/// the stem.
pub fn is_file_name_valid(file_name: &str) -> bool {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let stem = match base.rfind('.') {
        Some(idx) => &base[..idx],
        None => base,
    };

    stem.chars().any(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn file_name_rules() {
        assert!(is_file_name_valid("report.pdf"));
        assert!(is_file_name_valid("a1.txt"));
        assert!(is_file_name_valid("README"));
        assert!(is_file_name_valid("archive.tar.gz"));
        assert!(is_file_name_valid("données.csv"));
        assert!(!is_file_name_valid("12345.pdf"));
        assert!(!is_file_name_valid(".pdf"));
        assert!(!is_file_name_valid(""));
        assert!(!is_file_name_valid("docs/2024.pdf"));
        assert!(is_file_name_valid("2024/report.pdf"));
    }

    #[test]
    fn empty_blob_rejected_first() {
        let blob = FileBlob::new(Vec::new()).with_file_name("12345.pdf");
        assert!(matches!(validate_blob(&blob, MIB), Err(TransferError::EmptyFile)));
    }

    #[test]
    fn oversized_blob_rejected() {
        let blob = FileBlob::new(vec![0u8; 2 * MIB as usize]).with_file_name("big.bin");
        assert!(matches!(
            validate_blob(&blob, MIB),
            Err(TransferError::FileTooLarge { max_bytes }) if max_bytes == MIB
        ));
    }

    #[test]
    fn exactly_at_ceiling_is_accepted() {
        let blob = FileBlob::new(vec![1u8; MIB as usize]).with_file_name("edge.bin");
        assert!(validate_blob(&blob, MIB).is_ok());
    }

    #[test]
    fn numeric_name_rejected() {
        let blob = FileBlob::new(b"data".to_vec()).with_file_name("12345.pdf");
        let err = validate_blob(&blob, MIB).unwrap_err();
        assert_eq!(err.code(), "InvalidFileName");
    }

    #[test]
    fn missing_name_rejected() {
        let blob = FileBlob::new(b"data".to_vec());
        assert!(matches!(
            validate_blob(&blob, MIB),
            Err(TransferError::InvalidFileName { .. })
        ));
    }
}
