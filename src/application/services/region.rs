//! Region catalog service
//!
//! Loads region records, builds the index once and answers queries with
//! presenter-ready views (region plus ancestry).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use termtree::Tree;
use tracing::{debug, info, instrument};

use crate::application::loader::{parse_regions, RejectedLine};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    BuildReport, DomainError, QueryEngine, Region, RegionTree, TreeBuilder, TreeNodeConvert,
    CODE_LENGTH,
};
use crate::infrastructure::traits::FileSystem;

/// Options controlling how a catalog is loaded and built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep the sorted code index for O(log N) code lookups
    pub retain_code_index: bool,
    /// Maximum number of records read from one file
    pub max_records: usize,
    /// Required code length, None for any digit string
    pub code_length: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            retain_code_index: true,
            max_records: 700_000,
            code_length: Some(CODE_LENGTH),
        }
    }
}

impl From<&Settings> for LoadOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            retain_code_index: settings.retain_code_index,
            max_records: settings.max_records,
            code_length: settings.code_length(),
        }
    }
}

/// A region with its ancestry, nearest ancestor first, synthetic root excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionView {
    pub region: Region,
    pub ancestry: Vec<Region>,
}

impl RegionView {
    /// Ancestry ordered from the top-level region down to the parent.
    pub fn path_from_top(&self) -> impl Iterator<Item = &Region> {
        self.ancestry.iter().rev()
    }
}

/// Result of a bounded name search.
#[derive(Debug, Clone, PartialEq)]
pub struct NameSearch {
    pub matches: Vec<RegionView>,
    /// More matches exist beyond the limit
    pub truncated: bool,
}

/// Loads region files into queryable catalogs.
pub struct RegionService {
    fs: Arc<dyn FileSystem>,
    options: LoadOptions,
}

impl RegionService {
    /// Create a new region service.
    pub fn new(fs: Arc<dyn FileSystem>, options: LoadOptions) -> Self {
        Self { fs, options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read `path`, parse its records and build the tree.
    #[instrument(level = "debug", skip(self))]
    pub fn open(&self, path: &Path) -> ApplicationResult<RegionCatalog> {
        if !self.fs.exists(path) || !self.fs.is_file(path) {
            return Err(ApplicationError::DataFileNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read region file", path)?;
        self.open_str(&content, path)
    }

    /// Build a catalog from CSV text; `source` names the input in errors.
    pub fn open_str(&self, content: &str, source: &Path) -> ApplicationResult<RegionCatalog> {
        let loaded = parse_regions(content, self.options.max_records, self.options.code_length);
        if loaded.regions.is_empty() {
            return Err(ApplicationError::NoRecords(source.to_path_buf()));
        }
        info!(
            "loaded {} records from {} ({} rejected)",
            loaded.regions.len(),
            source.display(),
            loaded.rejected.len()
        );
        let record_count = loaded.regions.len();

        let outcome = TreeBuilder::new()
            .retain_code_index(self.options.retain_code_index)
            .build(loaded.regions)?;

        Ok(RegionCatalog {
            source: source.to_path_buf(),
            tree: Arc::new(outcome.tree),
            report: outcome.report,
            rejected: loaded.rejected,
            record_count,
            code_length: self.options.code_length,
        })
    }
}

/// A built region tree plus everything learned while loading it.
///
/// The tree is shared behind an `Arc`; clones of a catalog query the same tree.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    source: PathBuf,
    tree: Arc<RegionTree>,
    report: BuildReport,
    rejected: Vec<RejectedLine>,
    record_count: usize,
    code_length: Option<usize>,
}

impl RegionCatalog {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn tree(&self) -> &Arc<RegionTree> {
        &self.tree
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn rejected(&self) -> &[RejectedLine] {
        &self.rejected
    }

    /// Number of valid records handed to the builder.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.tree).with_code_length(self.code_length)
    }

    fn view(&self, idx: Index) -> ApplicationResult<RegionView> {
        let engine = self.engine();
        let region = self
            .tree
            .region(idx)
            .cloned()
            .ok_or(DomainError::UnknownNode)?;
        let ancestry = engine
            .ancestry_chain(idx)?
            .into_iter()
            .filter_map(|a| self.tree.region(a).cloned())
            .collect();
        Ok(RegionView { region, ancestry })
    }

    /// Exact lookup by code. Invalid codes are an error, unknown codes `None`.
    pub fn lookup_code(&self, code: &str) -> ApplicationResult<Option<RegionView>> {
        debug!("lookup_code: {}", code);
        self.engine()
            .find_by_code(code)?
            .map(|idx| self.view(idx))
            .transpose()
    }

    /// Substring search by name, at most `limit` results in tree order.
    pub fn search_name(&self, term: &str, limit: usize) -> ApplicationResult<NameSearch> {
        debug!("search_name: '{}' limit={}", term, limit);
        let found = self.engine().find_by_name(term, limit)?;
        let matches = found
            .nodes
            .into_iter()
            .map(|idx| self.view(idx))
            .collect::<ApplicationResult<Vec<_>>>()?;
        Ok(NameSearch {
            matches,
            truncated: found.truncated,
        })
    }

    /// Render the hierarchy below `code` (or the whole country) as a tree.
    pub fn subtree(
        &self,
        code: Option<&str>,
        max_depth: Option<usize>,
    ) -> ApplicationResult<Option<Tree<String>>> {
        let start = match code {
            Some(code) => match self.engine().find_by_code(code)? {
                Some(idx) => idx,
                None => return Ok(None),
            },
            None => self.tree.root(),
        };
        Ok(Some(self.tree.to_tree_string(start, max_depth)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    /// In-memory filesystem for service tests.
    #[derive(Default)]
    struct MemoryFs {
        files: HashMap<PathBuf, String>,
    }

    impl FileSystem for MemoryFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }
    }

    const DATA: &str = "code,name,level,parent_code,type,avg_house_price,employment_rate
110000000000,北京市,1,0,0,65000,N/A
110100000000,市辖区,2,110000000000,0
110101000000,东城区,3,110100000000,111,0,97.1%
";

    fn service_with(content: &str) -> (RegionService, PathBuf) {
        let path = PathBuf::from("/data/regions.csv");
        let mut fs = MemoryFs::default();
        fs.files.insert(path.clone(), content.to_string());
        (RegionService::new(Arc::new(fs), LoadOptions::default()), path)
    }

    #[test]
    fn given_csv_when_looking_up_code_then_returns_region_with_ancestry() {
        let (service, path) = service_with(DATA);
        let catalog = service.open(&path).unwrap();

        let view = catalog.lookup_code("110101000000").unwrap().unwrap();

        assert_eq!(view.region.name, "东城区");
        let ancestry: Vec<&str> = view.ancestry.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(ancestry, vec!["市辖区", "北京市"]);
        let top_down: Vec<&str> = view.path_from_top().map(|r| r.name.as_str()).collect();
        assert_eq!(top_down, vec!["北京市", "市辖区"]);
    }

    #[test]
    fn given_invalid_code_when_looking_up_then_validation_error_not_none() {
        let (service, path) = service_with(DATA);
        let catalog = service.open(&path).unwrap();

        let err = catalog.lookup_code("1101").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::InvalidCode(_))
        ));
        assert!(catalog.lookup_code("990000000000").unwrap().is_none());
    }

    #[test]
    fn given_missing_file_when_opening_then_data_file_not_found() {
        let (service, _) = service_with(DATA);
        let err = service.open(Path::new("/nope.csv")).unwrap_err();
        assert!(matches!(err, ApplicationError::DataFileNotFound(_)));
    }

    #[test]
    fn given_only_header_when_opening_then_no_records() {
        let (service, path) = service_with("code,name,level,parent_code,type\n");
        let err = service.open(&path).unwrap_err();
        assert!(matches!(err, ApplicationError::NoRecords(_)));
    }

    #[test]
    fn given_name_term_when_searching_then_returns_views_in_tree_order() {
        let (service, path) = service_with(DATA);
        let catalog = service.open(&path).unwrap();

        let result = catalog.search_name("区", 5).unwrap();

        let names: Vec<&str> = result.matches.iter().map(|v| v.region.name.as_str()).collect();
        assert_eq!(names, vec!["市辖区", "东城区"]);
        assert!(!result.truncated);
    }

    #[test]
    fn given_code_when_rendering_subtree_then_contains_children() {
        let (service, path) = service_with(DATA);
        let catalog = service.open(&path).unwrap();

        let rendered = catalog
            .subtree(Some("110000000000"), None)
            .unwrap()
            .unwrap()
            .to_string();
        assert!(rendered.contains("东城区 (110101000000)"));
        assert!(catalog.subtree(Some("990000000000"), None).unwrap().is_none());
    }
}
