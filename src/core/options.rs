use std::collections::BTreeMap;

use super::catalog::Catalog;
use super::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOptions {
    pub platform: String,
    pub architecture: String,
    pub params: BTreeMap<String, String>,
}

/// Split `a,b=c,d` into `(key, value)` pairs on the first `=` of each item.
///
/// Bare tokens get an empty value. A repeated key keeps its first position and
/// its last value.
pub fn params_from_annotation(value: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    if value.is_empty() {
        return pairs;
    }
    for item in value.split(',') {
        let (key, val) = item.split_once('=').unwrap_or((item, ""));
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = val.to_string(),
            None => pairs.push((key.to_string(), val.to_string())),
        }
    }
    pairs
}

/// Classify an option string into platform, architecture and free parameters.
///
/// Platform and architecture tokens are pulled out of the parameter map, so
/// they never appear as keys of [`ParsedOptions::params`].
pub fn parse_options(options: &str, catalog: &Catalog) -> Result<ParsedOptions, ParseError> {
    let mut platform: Option<String> = None;
    let mut architecture: Option<String> = None;
    let mut params = BTreeMap::new();

    for (key, value) in params_from_annotation(options) {
        if catalog.is_platform(&key) {
            if platform.is_some() {
                return Err(ParseError::DuplicatePlatform);
            }
            platform = Some(key);
        } else if catalog.is_architecture(&key) {
            if architecture.is_some() {
                return Err(ParseError::DuplicateArchitecture);
            }
            architecture = Some(key);
        } else if key.is_empty() {
            continue;
        } else if catalog.is_parameter(&key) {
            params.insert(key, value);
        } else {
            return Err(ParseError::UnrecognizedOption(key));
        }
    }

    Ok(ParsedOptions {
        platform: platform.unwrap_or_else(|| catalog.default_platform.clone()),
        architecture: architecture.unwrap_or_else(|| catalog.default_architecture.clone()),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_splits_on_first_equals() {
        let pairs = params_from_annotation("gcp,test=e2e,x=a=b");
        assert_eq!(
            pairs,
            vec![
                ("gcp".to_string(), String::new()),
                ("test".to_string(), "e2e".to_string()),
                ("x".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn annotation_last_write_wins() {
        let pairs = params_from_annotation("test=a,ovn,test=b");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("test".to_string(), "b".to_string()));
    }

    #[test]
    fn annotation_empty_is_empty() {
        assert!(params_from_annotation("").is_empty());
    }

    #[test]
    fn platform_and_parameter() {
        let parsed = parse_options("gcp,test=e2e", &Catalog::default()).unwrap();
        assert_eq!(parsed.platform, "gcp");
        assert_eq!(parsed.architecture, "amd64");
        assert_eq!(parsed.params.len(), 1);
        assert_eq!(parsed.params["test"], "e2e");
    }

    #[test]
    fn empty_options_use_defaults() {
        let parsed = parse_options("", &Catalog::default()).unwrap();
        assert_eq!(parsed.platform, "gcp");
        assert_eq!(parsed.architecture, "amd64");
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn second_platform_is_rejected() {
        let err = parse_options("gcp,aws", &Catalog::default()).unwrap_err();
        assert_eq!(err, ParseError::DuplicatePlatform);
        let err = parse_options("ovn,aws,fips,azure", &Catalog::default()).unwrap_err();
        assert_eq!(err, ParseError::DuplicatePlatform);
    }

    #[test]
    fn second_architecture_is_rejected() {
        let err = parse_options("arm64,multi", &Catalog::default()).unwrap_err();
        assert_eq!(err, ParseError::DuplicateArchitecture);
    }

    #[test]
    fn repeated_same_platform_collapses() {
        let parsed = parse_options("aws,aws", &Catalog::default()).unwrap();
        assert_eq!(parsed.platform, "aws");
    }

    #[test]
    fn unknown_option_is_named() {
        let err = parse_options("bogus", &Catalog::default()).unwrap_err();
        assert_eq!(err.to_string(), "unrecognized option: bogus");
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let parsed = parse_options("aws,,arm64,", &Catalog::default()).unwrap();
        assert_eq!(parsed.platform, "aws");
        assert_eq!(parsed.architecture, "arm64");
        assert!(parsed.params.is_empty());
    }

    #[test]
    fn platform_and_architecture_never_remain_as_params() {
        let catalog = Catalog::default();
        for options in ["azure,arm64,ovn", "metal,fips=true", "multi,single-node,aws"] {
            let parsed = parse_options(options, &catalog).unwrap();
            assert!(
                parsed
                    .params
                    .keys()
                    .all(|k| !catalog.is_platform(k) && !catalog.is_architecture(k)),
                "{options} leaked a selector into {:?}",
                parsed.params
            );
        }
    }

    #[test]
    fn catalog_defaults_are_configurable() {
        let catalog = Catalog {
            default_platform: "aws".to_string(),
            default_architecture: "arm64".to_string(),
            ..Catalog::default()
        };
        let parsed = parse_options("ovn", &catalog).unwrap();
        assert_eq!(parsed.platform, "aws");
        assert_eq!(parsed.architecture, "arm64");
    }
}
