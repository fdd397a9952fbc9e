//! Path resolution for histograms and artifacts

use crate::batch::SampleParams;
use crate::config::PathConfig;
use std::path::PathBuf;

/// Maps workloads and sample parameterizations to file locations
pub trait PathResolver: Send + Sync {
    /// Full-trace histogram of `workload`
    fn full_histogram(&self, workload: &str) -> PathBuf;

    /// Sample histogram of `workload` under `params`
    fn sample_histogram(&self, workload: &str, params: &SampleParams) -> PathBuf;

    /// JSON summary artifact; its presence marks the unit complete
    fn summary_artifact(&self, workload: &str, params: &SampleParams) -> PathBuf;

    /// Per-window CSV table
    fn window_table(&self, workload: &str, params: &SampleParams) -> PathBuf;

    /// Merged workload-level table
    fn workload_table(&self, workload: &str) -> PathBuf;
}

/// Resolver expanding the `{root}`, `{workload}`, `{rate}`, `{bits}` and
/// `{seed}` placeholders of [`PathConfig`] templates
///
/// `{rate}` expands to the rate's exact decimal text, or `n-d` for rates
/// without one, so it is always a single path component.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    paths: PathConfig,
}

impl TemplateResolver {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }

    fn expand(&self, template: &str, workload: &str, params: Option<&SampleParams>) -> PathBuf {
        let root = self.paths.root.to_string_lossy();
        let mut out = template
            .replace("{root}", root.trim_end_matches('/'))
            .replace("{workload}", workload);
        if let Some(p) = params {
            out = out
                .replace("{rate}", &p.rate.to_string().replace('/', "-"))
                .replace("{bits}", &p.bits.to_string())
                .replace("{seed}", &p.seed.to_string());
        }
        PathBuf::from(out)
    }
}

impl PathResolver for TemplateResolver {
    fn full_histogram(&self, workload: &str) -> PathBuf {
        self.expand(&self.paths.full_histogram, workload, None)
    }

    fn sample_histogram(&self, workload: &str, params: &SampleParams) -> PathBuf {
        self.expand(&self.paths.sample_histogram, workload, Some(params))
    }

    fn summary_artifact(&self, workload: &str, params: &SampleParams) -> PathBuf {
        self.expand(&self.paths.summary, workload, Some(params))
    }

    fn window_table(&self, workload: &str, params: &SampleParams) -> PathBuf {
        self.expand(&self.paths.windows, workload, Some(params))
    }

    fn workload_table(&self, workload: &str) -> PathBuf {
        self.expand(&self.paths.workload_table, workload, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::RationalRate;

    fn params(rate: &str) -> SampleParams {
        SampleParams {
            rate: RationalRate::parse(rate).unwrap(),
            bits: 4,
            seed: 42,
        }
    }

    #[test]
    fn test_default_templates() {
        let resolver = TemplateResolver::new(PathConfig {
            root: PathBuf::from("/data/"),
            ..Default::default()
        });
        assert_eq!(
            resolver.full_histogram("w01"),
            PathBuf::from("/data/rd_hist/w01.csv")
        );
        assert_eq!(
            resolver.sample_histogram("w01", &params("0.01")),
            PathBuf::from("/data/rd_hist/sample/w01/rate=0.01_bits=4_seed=42.csv")
        );
        assert_eq!(
            resolver.summary_artifact("w01", &params("0.01")),
            PathBuf::from("/data/hrc_err/w01/rate=0.01_bits=4_seed=42.json")
        );
        assert_eq!(
            resolver.workload_table("w01"),
            PathBuf::from("/data/hrc_err/w01.csv")
        );
    }

    #[test]
    fn test_fraction_rate_is_one_component() {
        let resolver = TemplateResolver::new(PathConfig::default());
        let path = resolver.window_table("w", &params("1/3"));
        assert!(path.to_string_lossy().ends_with("rate=1-3_bits=4_seed=42.windows.csv"));
    }
}
