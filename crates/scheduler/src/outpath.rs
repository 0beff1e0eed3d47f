use std::path::{Path, PathBuf};
use thiserror::Error;
use crate::profile::Profile;

/// Longest output path the scheduler will hand to an external tool, in bytes.
pub const MAX_PATH_BYTES: usize = 4096;

/// Failure to derive a usable output path for an input file.
#[derive(Debug, Error)]
pub enum OutPathError {
    #[error("derived output path for '{}' exceeds {} bytes", .input.display(), MAX_PATH_BYTES)]
    TooLong { input: PathBuf },
}

/// Derive the output path for `input` under `profile` by swapping the
/// input's extension for the profile's.
pub fn derive_output(input: &Path, profile: &Profile) -> Result<PathBuf, OutPathError> {
    checked(input, input.with_extension(profile.extension()))
}

/// Intermediate WebM path used by the two-stage mux profile; sits next to
/// the final output.
pub fn webm_intermediate(output: &Path) -> Result<PathBuf, OutPathError> {
    checked(output, output.with_extension("webm"))
}

fn checked(input: &Path, candidate: PathBuf) -> Result<PathBuf, OutPathError> {
    if candidate.as_os_str().len() > MAX_PATH_BYTES {
        return Err(OutPathError::TooLong {
            input: input.to_path_buf(),
        });
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CustomTemplate;
    use proptest::prelude::*;

    #[test]
    fn swaps_extension_for_fixed_profiles() {
        let out = derive_output(Path::new("/media/title_1.vob"), &Profile::Webm).unwrap();
        assert_eq!(out, PathBuf::from("/media/title_1.webm"));
        let out = derive_output(Path::new("/media/title_1.vob"), &Profile::Mkv).unwrap();
        assert_eq!(out, PathBuf::from("/media/title_1.mkv"));
    }

    #[test]
    fn custom_suffix_comes_from_the_template() {
        let template = CustomTemplate::parse("enc %i %o.avi").unwrap();
        let out = derive_output(Path::new("a/b.vob"), &Profile::Custom(template)).unwrap();
        assert_eq!(out, PathBuf::from("a/b.avi"));
    }

    #[test]
    fn bare_output_placeholder_drops_the_extension() {
        let template = CustomTemplate::parse("enc %i %o").unwrap();
        let out = derive_output(Path::new("a/b.vob"), &Profile::Custom(template)).unwrap();
        assert_eq!(out, PathBuf::from("a/b"));
    }

    #[test]
    fn dots_in_the_stem_survive() {
        let out = derive_output(Path::new("disc.1.vob"), &Profile::Webm).unwrap();
        assert_eq!(out, PathBuf::from("disc.1.webm"));
    }

    #[test]
    fn over_long_paths_are_rejected() {
        let input = PathBuf::from(format!("/tmp/{}.vob", "a".repeat(MAX_PATH_BYTES)));
        let err = derive_output(&input, &Profile::Webm).unwrap_err();
        assert!(matches!(err, OutPathError::TooLong { .. }));
    }

    #[test]
    fn intermediate_webm_sits_next_to_the_output() {
        let path = webm_intermediate(Path::new("/media/title.mkv")).unwrap();
        assert_eq!(path, PathBuf::from("/media/title.webm"));
    }

    proptest! {
        #[test]
        fn derived_output_keeps_the_parent_and_swaps_the_extension(
            stem in "[a-z0-9_]{1,32}",
            ext in "[a-z0-9]{1,5}",
        ) {
            let input = PathBuf::from(format!("/library/{stem}.{ext}"));
            let out = derive_output(&input, &Profile::Webm).unwrap();
            prop_assert_eq!(out.parent(), input.parent());
            prop_assert_eq!(out.extension().and_then(|e| e.to_str()), Some("webm"));
            prop_assert_eq!(out.file_stem(), input.file_stem());
        }
    }
}
