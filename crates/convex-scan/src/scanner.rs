//! Source scanning
//!
//! Every `.rs` file below the source roots is parsed with `syn` in parallel. A file yields the
//! types carrying `#[auto_transformer]`, the types it implements `Transformer` for, and the
//! out-of-line modules it declares. Only files reachable through `mod` declarations from the
//! crate root count: `lib.rs` when the package has a library, `main.rs` otherwise. Validation
//! runs once all files are in, since the impl for a type may live in another file than the type
//! itself.

use convex_logger as logger;
use convex_manifest::{Manifest, TransformerId};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use syn::punctuated::Punctuated;
use syn::{Attribute, Generics, Ident, Item, ItemMod, Meta, Token, Type, Visibility};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::{DiscoveryError, Rejection, RejectionReason};
use crate::module_path::{is_within, module_path_for, ROOT_FILES};

const MARKER: &str = "auto_transformer";
const CAPABILITY: &str = "Transformer";

/// One accepted transformer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub id: TransformerId,
    pub file: PathBuf,
    pub line: usize,
}

/// Outcome of scanning a crate's sources
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Accepted transformers, sorted by id
    pub accepted: Vec<Discovered>,
    pub files_scanned: usize,
    /// Files that failed to parse
    pub files_skipped: usize,
}

impl ScanReport {
    pub fn manifest(&self) -> Manifest {
        self.accepted.iter().map(|d| d.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Concrete,
    Trait,
    Other,
}

#[derive(Debug, Clone)]
struct Candidate {
    module: Vec<String>,
    name: String,
    file: PathBuf,
    line: usize,
    kind: Kind,
    public: bool,
    generic: bool,
}

#[derive(Debug, Clone)]
struct ImplTarget {
    /// Module the impl block sits in
    module: Vec<String>,
    /// Self type resolved against that module, when it names a type of this crate
    path: Option<Vec<String>>,
    name: String,
}

#[derive(Debug, Default)]
struct FileScan {
    root: PathBuf,
    file: PathBuf,
    /// `None` for files outside the crate target
    module: Option<Vec<String>>,
    candidates: Vec<Candidate>,
    impls: Vec<ImplTarget>,
    test_modules: Vec<Vec<String>>,
    /// Out-of-line modules declared by the file, as full module paths
    declared: Vec<Vec<String>>,
}

impl FileScan {
    fn is_root_file(&self, name: &str) -> bool {
        self.module.as_ref().is_some_and(|m| m.is_empty())
            && self.file.file_name().is_some_and(|n| n == name)
    }
}

/// Scanner over one crate's source roots
#[derive(Debug, Clone)]
pub struct Scanner {
    crate_name: String,
    source_roots: Vec<PathBuf>,
}

impl Scanner {
    pub fn new(crate_name: impl Into<String>, source_roots: Vec<PathBuf>) -> Self {
        let crate_name = crate_name.into().replace('-', "_");
        debug!(
            "Initializing transformer scanner for {} over {:?}",
            crate_name, source_roots
        );
        Scanner {
            crate_name,
            source_roots,
        }
    }

    /// Scanner for `source_dirs` relative to a crate directory
    pub fn for_crate(crate_name: &str, crate_dir: &Path, source_dirs: &[String]) -> Self {
        let roots = source_dirs.iter().map(|dir| crate_dir.join(dir)).collect();
        Self::new(crate_name, roots)
    }

    pub fn crate_name(&self) -> &str {
        &self.crate_name
    }

    /// Every Rust file below the source roots, paired with its root, sorted
    pub fn source_files(&self) -> Result<Vec<(PathBuf, PathBuf)>, DiscoveryError> {
        let mut files = Vec::new();
        for root in &self.source_roots {
            if !root.is_dir() {
                return Err(DiscoveryError::SourceRoot(root.clone()));
            }
            files.extend(
                WalkDir::new(root)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
                    .map(|e| (root.clone(), e.into_path())),
            );
        }
        files.sort();
        Ok(files)
    }

    /// Scan and validate, failing with every rejected type at once
    pub fn scan(&self) -> Result<ScanReport, DiscoveryError> {
        let files = self.source_files()?;
        logger::debug(&format!(
            "Scanning {} source files of {}",
            files.len(),
            self.crate_name
        ));

        let scans: Vec<Option<FileScan>> = files
            .par_iter()
            .map(|(root, file)| scan_file(root, file))
            .collect::<Result<_, _>>()?;

        let files_scanned = files.len();
        let files_skipped = scans.iter().filter(|s| s.is_none()).count();
        let mut merged = FileScan::default();
        for scan in included_files(scans.into_iter().flatten().collect()) {
            merged.candidates.extend(scan.candidates);
            merged.impls.extend(scan.impls);
            merged.test_modules.extend(scan.test_modules);
        }

        let report = self.validate(merged, files_scanned, files_skipped)?;
        info!(
            "Scanned {} files of {}, accepted {} transformers",
            report.files_scanned,
            self.crate_name,
            report.accepted.len()
        );
        Ok(report)
    }

    fn validate(
        &self,
        scan: FileScan,
        files_scanned: usize,
        files_skipped: usize,
    ) -> Result<ScanReport, DiscoveryError> {
        let in_tests =
            |module: &[String]| scan.test_modules.iter().any(|t| is_within(module, t));

        let impls: Vec<&ImplTarget> = scan.impls.iter().filter(|i| !in_tests(&i.module)).collect();
        let qualified: HashSet<&[String]> = impls.iter().filter_map(|i| i.path.as_deref()).collect();
        let names: HashSet<&str> = impls.iter().map(|i| i.name.as_str()).collect();

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for candidate in scan.candidates.iter().filter(|c| !in_tests(&c.module)) {
            let mut path = candidate.module.clone();
            path.push(candidate.name.clone());

            let reason = match candidate.kind {
                Kind::Trait => Some(RejectionReason::Abstract),
                Kind::Other => Some(RejectionReason::NotAType),
                Kind::Concrete if !candidate.public => Some(RejectionReason::NotPublic),
                Kind::Concrete if candidate.generic => Some(RejectionReason::Generic),
                // An impl written through a `use` import only matches by name
                Kind::Concrete
                    if !qualified.contains(path.as_slice())
                        && !names.contains(candidate.name.as_str()) =>
                {
                    Some(RejectionReason::MissingCapability)
                }
                Kind::Concrete => None,
            };

            match reason {
                Some(reason) => rejected.push(Rejection {
                    type_name: candidate.name.clone(),
                    file: candidate.file.clone(),
                    line: candidate.line,
                    reason,
                }),
                None => {
                    let id = TransformerId::from_parts(
                        &self.crate_name,
                        &candidate.module,
                        &candidate.name,
                    )?;
                    debug!("Accepted transformer {} ({:?})", id, candidate.file);
                    accepted.push(Discovered {
                        id,
                        file: candidate.file.clone(),
                        line: candidate.line,
                    });
                }
            }
        }

        if !rejected.is_empty() {
            rejected.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
            return Err(DiscoveryError::Rejected(rejected));
        }

        accepted.sort_by(|a, b| a.id.cmp(&b.id));
        accepted.dedup_by(|a, b| a.id == b.id);
        Ok(ScanReport {
            accepted,
            files_scanned,
            files_skipped,
        })
    }
}

/// Files the compiler builds into the crate.
///
/// Per source root, starts from `lib.rs` (or `main.rs` when there is no library) and follows
/// `mod` declarations. A root without either file keeps everything below it.
fn included_files(scans: Vec<FileScan>) -> Vec<FileScan> {
    let mut by_root: BTreeMap<PathBuf, Vec<FileScan>> = BTreeMap::new();
    for scan in scans.into_iter().filter(|s| s.module.is_some()) {
        by_root.entry(scan.root.clone()).or_default().push(scan);
    }

    let mut included = Vec::new();
    for (root, scans) in by_root {
        let Some(entry) = ROOT_FILES
            .iter()
            .copied()
            .find(|name| scans.iter().any(|s| s.is_root_file(name)))
        else {
            included.extend(scans);
            continue;
        };

        let mut reachable: HashSet<Vec<String>> = HashSet::new();
        let mut pending = Vec::new();
        for scan in scans {
            if scan.is_root_file(entry) {
                reachable.extend(scan.declared.iter().cloned());
                included.push(scan);
            } else if scan.module.as_ref().is_some_and(|m| m.is_empty()) {
                debug!("Skipping {:?}, {} is the crate root", scan.file, entry);
            } else {
                pending.push(scan);
            }
        }

        loop {
            let (now, later): (Vec<FileScan>, Vec<FileScan>) = pending
                .into_iter()
                .partition(|s| s.module.as_ref().is_some_and(|m| reachable.contains(m)));
            pending = later;
            if now.is_empty() {
                break;
            }
            for scan in now {
                reachable.extend(scan.declared.iter().cloned());
                included.push(scan);
            }
        }

        for scan in pending {
            debug!(
                "Skipping {:?}, not declared from {}",
                scan.file,
                root.join(entry).display()
            );
        }
    }
    included
}

/// `Ok(None)` for files that don't parse
fn scan_file(root: &Path, file: &Path) -> Result<Option<FileScan>, DiscoveryError> {
    let Some(module) = module_path_for(root, file) else {
        debug!("Skipping {:?}, not part of the library or main target", file);
        return Ok(Some(FileScan {
            root: root.to_path_buf(),
            file: file.to_path_buf(),
            ..FileScan::default()
        }));
    };

    let content = fs::read_to_string(file).map_err(|source| DiscoveryError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    match scan_source(&content, module.clone(), file) {
        Ok(scan) => Ok(Some(FileScan {
            root: root.to_path_buf(),
            file: file.to_path_buf(),
            module: Some(module),
            ..scan
        })),
        Err(e) => {
            // The compiler reports the syntax error with better context
            warn!("Skipping {:?}, failed to parse: {}", file, e);
            logger::debug(&format!("Skipping {}: {}", file.display(), e));
            Ok(None)
        }
    }
}

fn scan_source(content: &str, mut module: Vec<String>, file: &Path) -> syn::Result<FileScan> {
    let parsed = syn::parse_file(content)?;
    let mut scan = FileScan::default();
    visit_items(&parsed.items, &mut module, file, &mut scan);
    Ok(scan)
}

fn visit_items(items: &[Item], module: &mut Vec<String>, file: &Path, scan: &mut FileScan) {
    for item in items {
        match item {
            Item::Mod(item_mod) => visit_mod(item_mod, module, file, scan),
            Item::Impl(item_impl) => {
                let implements_capability = item_impl
                    .trait_
                    .as_ref()
                    .filter(|(negative, _, _)| negative.is_none())
                    .and_then(|(_, path, _)| path.segments.last())
                    .is_some_and(|segment| segment.ident == CAPABILITY);
                if !implements_capability {
                    continue;
                }
                if let Type::Path(type_path) = item_impl.self_ty.as_ref() {
                    if type_path.qself.is_some() {
                        continue;
                    }
                    if let Some(last) = type_path.path.segments.last() {
                        scan.impls.push(ImplTarget {
                            module: module.clone(),
                            path: resolve(module, &type_path.path),
                            name: last.ident.to_string(),
                        });
                    }
                }
            }
            other => {
                if let Some(candidate) = candidate(other, module, file) {
                    scan.candidates.push(candidate);
                }
            }
        }
    }
}

fn visit_mod(item_mod: &ItemMod, module: &mut Vec<String>, file: &Path, scan: &mut FileScan) {
    if is_cfg_test(&item_mod.attrs) {
        let mut test_module = module.clone();
        test_module.push(item_mod.ident.to_string());
        scan.test_modules.push(test_module);
        return;
    }
    match &item_mod.content {
        Some((_, items)) => {
            module.push(item_mod.ident.to_string());
            visit_items(items, module, file, scan);
            module.pop();
        }
        None => {
            let mut declared = module.clone();
            declared.push(item_mod.ident.to_string());
            scan.declared.push(declared);
        }
    }
}

fn candidate(item: &Item, module: &[String], file: &Path) -> Option<Candidate> {
    let (attrs, ident, vis, generics, kind): (
        &Vec<Attribute>,
        &Ident,
        &Visibility,
        Option<&Generics>,
        Kind,
    ) =
        match item {
            Item::Struct(s) => (&s.attrs, &s.ident, &s.vis, Some(&s.generics), Kind::Concrete),
            Item::Enum(e) => (&e.attrs, &e.ident, &e.vis, Some(&e.generics), Kind::Concrete),
            Item::Trait(t) => (&t.attrs, &t.ident, &t.vis, Some(&t.generics), Kind::Trait),
            Item::Union(u) => (&u.attrs, &u.ident, &u.vis, Some(&u.generics), Kind::Other),
            Item::Type(t) => (&t.attrs, &t.ident, &t.vis, Some(&t.generics), Kind::Other),
            Item::Fn(f) => (&f.attrs, &f.sig.ident, &f.vis, Some(&f.sig.generics), Kind::Other),
            Item::Const(c) => (&c.attrs, &c.ident, &c.vis, None, Kind::Other),
            Item::Static(s) => (&s.attrs, &s.ident, &s.vis, None, Kind::Other),
            _ => return None,
        };

    if !attrs.iter().any(is_marker) {
        return None;
    }

    Some(Candidate {
        module: module.to_vec(),
        name: ident.to_string(),
        file: file.to_path_buf(),
        line: ident.span().start().line,
        kind,
        public: matches!(vis, Visibility::Public(_)),
        generic: generics.is_some_and(|g| !g.params.is_empty()),
    })
}

fn is_marker(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == MARKER)
}

/// Whether a `#[cfg(..)]` on the item only holds in test builds
fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("cfg"))
        .filter_map(|attr| attr.parse_args::<Meta>().ok())
        .any(|predicate| requires_test(&predicate))
}

fn requires_test(predicate: &Meta) -> bool {
    match predicate {
        Meta::Path(path) => path.is_ident("test"),
        Meta::List(list) => {
            let Ok(nested) = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            else {
                return false;
            };
            if list.path.is_ident("all") {
                nested.iter().any(requires_test)
            } else if list.path.is_ident("any") {
                !nested.is_empty() && nested.iter().all(requires_test)
            } else {
                // `not(..)` and unknown predicates
                false
            }
        }
        Meta::NameValue(_) => false,
    }
}

/// Resolve a path written in `module` to a crate-relative path.
///
/// Paths with a leading `::` name other crates and resolve to `None`.
fn resolve(module: &[String], path: &syn::Path) -> Option<Vec<String>> {
    if path.leading_colon.is_some() {
        return None;
    }
    let mut base = module.to_vec();
    let mut segments = path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .peekable();

    match segments.peek().map(String::as_str) {
        Some("crate") => {
            base.clear();
            segments.next();
        }
        Some("self") => {
            segments.next();
        }
        _ => {}
    }
    while segments.peek().map(String::as_str) == Some("super") {
        base.pop()?;
        segments.next();
    }
    base.extend(segments);
    Some(base)
}
