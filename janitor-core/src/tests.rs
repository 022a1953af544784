//! End-to-end test suite for janitor-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: impl AsRef<[u8]>) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("janitor_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Discovery returning a fixed list of names.
struct Names(Vec<&'static str>);

impl EntityDiscovery for Names {
    fn discover(&self, _root: &Path) -> JanitorResult<Vec<Candidate>> {
        Ok(self.0.iter().map(|n| Candidate::new(*n)).collect())
    }
}

/// One `render('<name>')` needle per entity; `broken` fails to compute.
struct RenderCalls {
    weight: i64,
}

impl UsageSource for RenderCalls {
    fn kind(&self) -> &'static str {
        "view"
    }

    fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
        if entity.name == "broken" {
            return Err(JanitorError::invalid_needle("render-call", "no patterns"));
        }
        Ok(vec![Needle::new(
            "render-call",
            [format!(r"render\('{}'\)", regex::escape(&entity.name))],
            self.weight,
        )?])
    }
}

fn render_analysis(root: &Path, names: Vec<&'static str>) -> AnalysisReport {
    Analyzer::new(root)
        .analyze(&Names(names), Arc::new(RenderCalls { weight: 10 }))
        .unwrap()
}

// Scenario: a literal reference is found and weighted
#[test]
fn test_reference_found() {
    let root = setup_temp_project();
    write_file(&root.join("views/home.view"), "<h1>Home</h1>");
    write_file(&root.join("controller.src"), "return render('home');");

    let report = render_analysis(&root, vec!["home"]);
    let home = report.entity("home").unwrap();

    assert_eq!(home.usage, 10);
    assert_eq!(home.occurrences, ["controller.src"]);
    assert_eq!(home.verdict, UsageVerdict::Used);
    assert_eq!(home.attributions[0].needle, "render-call");
}

// Scenario: no reference leaves the entity untouched
#[test]
fn test_reference_absent() {
    let root = setup_temp_project();
    write_file(&root.join("views/home.view"), "<h1>Home</h1>");
    write_file(&root.join("controller.src"), "return render('about');");

    let report = render_analysis(&root, vec!["home"]);
    let home = report.entity("home").unwrap();

    assert_eq!(home.usage, 0);
    assert!(home.occurrences.is_empty());
    assert_eq!(home.verdict, UsageVerdict::Unused);
    assert!(home.error.is_none());
}

// A negative threshold never turns zero evidence into a used verdict
#[test]
fn test_negative_threshold_unreferenced_is_unused() {
    let root = setup_temp_project();
    write_file(&root.join("controller.src"), "return render('about');");

    let report = Analyzer::new(&root)
        .threshold(-1)
        .analyze(&Names(vec!["home", "about"]), Arc::new(RenderCalls { weight: 10 }))
        .unwrap();

    assert_eq!(report.entity("home").unwrap().verdict, UsageVerdict::Unused);
    assert_eq!(report.entity("about").unwrap().verdict, UsageVerdict::Used);
    assert!(report.has_unused());
}

// One failing entity does not disturb the others
#[test]
fn test_fault_isolation() {
    let root = setup_temp_project();
    write_file(&root.join("a.src"), "render('home'); render('broken');");

    let report = render_analysis(&root, vec!["home", "broken", "about"]);

    let broken = report.entity("broken").unwrap();
    assert_eq!(broken.verdict, UsageVerdict::Incomplete);
    assert_eq!(broken.usage, 0);
    assert!(broken.occurrences.is_empty());
    assert_eq!(broken.error.as_ref().unwrap().kind, "invalid_needle");

    assert_eq!(report.entity("home").unwrap().usage, 10);
    assert_eq!(report.entity("about").unwrap().verdict, UsageVerdict::Unused);
    assert_eq!(report.stats.incomplete, 1);
    assert_eq!(report.stats.unused, 1);
}

// A panicking usage source fails only the entity it panicked for
#[test]
fn test_panic_isolated_to_entity() {
    struct Panicking;

    impl UsageSource for Panicking {
        fn kind(&self) -> &'static str {
            "stub"
        }

        fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
            if entity.name == "broken" {
                panic!("matrix for {} blew up", entity.name);
            }
            Ok(vec![Needle::literal("name", &entity.name, 10)?])
        }
    }

    let root = setup_temp_project();
    write_file(&root.join("a.src"), "home broken");

    for sequential in [false, true] {
        let report = Analyzer::new(&root)
            .sequential(sequential)
            .analyze(&Names(vec!["home", "broken"]), Arc::new(Panicking))
            .unwrap();

        assert_eq!(report.entity("home").unwrap().verdict, UsageVerdict::Used);

        let broken = report.entity("broken").unwrap();
        assert_eq!(broken.verdict, UsageVerdict::Incomplete);
        assert!(broken.occurrences.is_empty());
        let error = broken.error.as_ref().unwrap();
        assert_eq!(error.kind, "analysis_failure");
        assert!(error.message.contains("matrix for broken blew up"));
    }
}

// A malformed pattern is recorded against its entity only
#[test]
fn test_invalid_pattern_recorded() {
    struct Unbalanced;

    impl UsageSource for Unbalanced {
        fn kind(&self) -> &'static str {
            "stub"
        }

        fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
            Ok(vec![Needle::new("raw", [format!("({}", entity.name)], 1)?])
        }
    }

    let root = setup_temp_project();
    write_file(&root.join("a.src"), "(home");

    let report = Analyzer::new(&root)
        .analyze(&Names(vec!["home"]), Arc::new(Unbalanced))
        .unwrap();
    let home = report.entity("home").unwrap();

    assert_eq!(home.error.as_ref().unwrap().kind, "invalid_pattern");
    assert_eq!(home.verdict, UsageVerdict::Incomplete);
    // The matrix itself computed fine and is still reported
    assert_eq!(home.usage_pattern, "(home");
}

// One binary file adds exactly one to the skipped tally
#[test]
fn test_unreadable_file_tolerance() {
    let root = setup_temp_project();
    write_file(&root.join("controller.src"), "render('home')");

    let before = render_analysis(&root, vec!["home"]);
    write_file(&root.join("logo.png"), [0x89u8, 0x50, 0x4e, 0x47, 0x00, 0xff]);
    let after = render_analysis(&root, vec!["home"]);

    assert_eq!(after.stats.files_skipped, before.stats.files_skipped + 1);
    assert_eq!(after.skipped_files.len(), after.stats.files_skipped);
    assert_eq!(after.entity("home").unwrap().usage, 10);
    assert_eq!(after.stats.files_scanned, before.stats.files_scanned);
}

// Invalid UTF-8 is skipped like binary content
#[test]
fn test_invalid_utf8_skipped() {
    let root = setup_temp_project();
    write_file(&root.join("latin1.txt"), [b'c', b'a', b'f', 0xe9]);
    write_file(&root.join("controller.src"), "render('home')");

    let report = render_analysis(&root, vec!["home"]);
    assert_eq!(report.stats.files_skipped, 1);
    assert!(report.skipped_files[0].reason.contains("UTF-8"));
}

// InvalidRoot is raised before discovery runs
#[test]
fn test_invalid_root_before_discovery() {
    struct Counting(AtomicUsize);

    impl EntityDiscovery for Counting {
        fn discover(&self, _root: &Path) -> JanitorResult<Vec<Candidate>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    let discovery = Counting(AtomicUsize::new(0));
    let missing = setup_temp_project().join("does-not-exist");
    let err = Analyzer::new(&missing)
        .analyze(&discovery, Arc::new(RenderCalls { weight: 1 }))
        .unwrap_err();

    assert!(matches!(err, JanitorError::InvalidRoot { .. }));
    assert!(!err.is_recoverable());
    assert_eq!(discovery.0.load(Ordering::SeqCst), 0);
}

// Discovery failure aborts the run
#[test]
fn test_discovery_failure_is_fatal() {
    struct Failing;

    impl EntityDiscovery for Failing {
        fn discover(&self, root: &Path) -> JanitorResult<Vec<Candidate>> {
            Err(JanitorError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        }
    }

    let root = setup_temp_project();
    let err = Analyzer::new(&root)
        .analyze(&Failing, Arc::new(RenderCalls { weight: 1 }))
        .unwrap_err();
    assert_eq!(err.kind(), "discovery");
}

// Every matching needle adds its weight once, across any number of files
#[test]
fn test_weights_summed_once_per_needle() {
    struct Weighted;

    impl UsageSource for Weighted {
        fn kind(&self) -> &'static str {
            "stub"
        }

        fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
            Ok(vec![
                Needle::literal("call", &format!("render('{}')", entity.name), 10)?,
                Needle::literal("mention", &entity.name, 2)?,
                Needle::literal("deprecated", "@deprecated", -5)?,
            ])
        }
    }

    let root = setup_temp_project();
    write_file(&root.join("a.src"), "render('home')");
    write_file(&root.join("b.src"), "render('home')");
    write_file(&root.join("c.src"), "home @deprecated");

    let report = Analyzer::new(&root)
        .analyze(&Names(vec!["home"]), Arc::new(Weighted))
        .unwrap();
    let home = report.entity("home").unwrap();

    assert_eq!(home.usage, 10 + 2 - 5);
    assert_eq!(home.occurrences, ["a.src", "b.src", "c.src"]);
    let credited: Vec<&str> = home.attributions.iter().map(|a| a.needle.as_str()).collect();
    assert_eq!(credited, ["call", "call", "mention"]);
}

// Negative evidence alone reads as doubtful, not used
#[test]
fn test_negative_only_is_doubtful() {
    let root = setup_temp_project();
    write_file(&root.join("a.src"), "render('legacy')");

    let report = Analyzer::new(&root)
        .analyze(&Names(vec!["legacy"]), Arc::new(RenderCalls { weight: -1 }))
        .unwrap();
    let legacy = report.entity("legacy").unwrap();

    assert_eq!(legacy.usage, -1);
    assert_eq!(legacy.verdict, UsageVerdict::Doubtful);
}

// Path needles match relative paths, not contents
#[test]
fn test_path_needle() {
    struct ByPath;

    impl UsageSource for ByPath {
        fn kind(&self) -> &'static str {
            "stub"
        }

        fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
            Ok(vec![Needle::new(
                "test-file",
                [format!(r"^tests/{}_test\.src$", regex::escape(&entity.name))],
                4,
            )?
            .targeting(NeedleTarget::Path)])
        }
    }

    let root = setup_temp_project();
    write_file(&root.join("tests/home_test.src"), "assert true");
    write_file(&root.join("notes.txt"), "tests/home_test.src");

    let report = Analyzer::new(&root)
        .analyze(&Names(vec!["home"]), Arc::new(ByPath))
        .unwrap();
    let home = report.entity("home").unwrap();

    assert_eq!(home.usage, 4);
    assert_eq!(home.occurrences, ["tests/home_test.src"]);
}

// Parallel and sequential runs agree, including occurrence order
#[test]
fn test_sequential_matches_parallel() {
    let root = setup_temp_project();
    for i in 0..40 {
        let target = if i % 3 == 0 { "home" } else { "about" };
        write_file(
            &root.join(format!("src/file_{:02}.src", i)),
            format!("render('{}')", target),
        );
    }
    let names = vec!["home", "about", "contact"];

    let parallel = render_analysis(&root, names.clone());
    let sequential = Analyzer::new(&root)
        .sequential(true)
        .analyze(&Names(names), Arc::new(RenderCalls { weight: 10 }))
        .unwrap();

    for (p, s) in parallel.entities.iter().zip(&sequential.entities) {
        assert_eq!(p.name, s.name);
        assert_eq!(p.usage, s.usage);
        assert_eq!(p.occurrences, s.occurrences);
    }
    assert_eq!(parallel.entity("home").unwrap().occurrences.len(), 14);
    assert_eq!(parallel.entity("home").unwrap().occurrences[0], "src/file_00.src");
    assert_eq!(parallel.entity("contact").unwrap().verdict, UsageVerdict::Unused);
}

// Excluded directories never contribute occurrences
#[test]
fn test_excluded_dirs() {
    let root = setup_temp_project();
    write_file(&root.join("vendor/lib.src"), "render('home')");
    write_file(&root.join("build/out.src"), "render('home')");

    let report = Analyzer::new(&root)
        .exclude_dirs(["build"])
        .analyze(&Names(vec!["home"]), Arc::new(RenderCalls { weight: 10 }))
        .unwrap();

    assert_eq!(report.entity("home").unwrap().verdict, UsageVerdict::Unused);
    assert_eq!(report.stats.files_scanned, 0);
}

#[cfg(feature = "kinds")]
mod kinds_tests {
    use super::*;

    #[test]
    fn test_routes_end_to_end() {
        let root = setup_temp_project();
        write_file(
            &root.join("routes/web.php"),
            "Route::get('/', 'Home@index')->name('home');\n\
             Route::get('/about', 'Home@about')->name('about');\n\
             Route::get('/legacy', ['as' => 'legacy', 'uses' => 'Old@index']);",
        );
        write_file(
            &root.join("resources/views/layout.blade.php"),
            "<a href=\"{{ route('home') }}\">Home</a>",
        );
        write_file(
            &root.join("app/Http/Controllers/AuthController.php"),
            "return redirect()->route('about');",
        );

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Routes::default()))
            .unwrap();

        assert_eq!(report.kind, "route");
        let home = report.entity("home").unwrap();
        assert_eq!(home.usage, 11);
        assert_eq!(home.occurrences, ["resources/views/layout.blade.php"]);

        let about = report.entity("about").unwrap();
        assert_eq!(about.usage, 11);
        assert_eq!(about.attributions[0].needle, "redirect-route");

        // Only mentioned in its own definition file
        assert_eq!(report.entity("legacy").unwrap().verdict, UsageVerdict::Unused);
    }

    #[test]
    fn test_routes_latin1_file_still_discovered() {
        let root = setup_temp_project();
        write_file(
            &root.join("routes/web.php"),
            "Route::get('/', 'Home@index')->name('home');",
        );
        let mut legacy = b"// caf\xe9 menu\n".to_vec();
        legacy.extend_from_slice(b"Route::get('/menu', 'Menu@index')->name('menu');");
        write_file(&root.join("routes/legacy.php"), legacy);
        write_file(&root.join("app/nav.php"), "route('menu')");

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Routes::default()))
            .unwrap();

        let names: Vec<&str> = report.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["menu", "home"]);
        assert_eq!(report.entity("menu").unwrap().verdict, UsageVerdict::Used);
        assert_eq!(report.entity("home").unwrap().verdict, UsageVerdict::Unused);
    }

    #[test]
    fn test_views_end_to_end() {
        let root = setup_temp_project();
        write_file(&root.join("resources/views/layout.blade.php"), "@yield('content')");
        write_file(
            &root.join("resources/views/home.blade.php"),
            "@extends('layout')\n@include('partials.nav')",
        );
        write_file(&root.join("resources/views/partials/nav.blade.php"), "<nav></nav>");
        write_file(&root.join("resources/views/orphan.blade.php"), "<p>alone</p>");
        write_file(
            &root.join("app/Http/Controllers/HomeController.php"),
            "return view('home');",
        );

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Views::default()))
            .unwrap();

        assert_eq!(report.entity("home").unwrap().usage, 10);
        assert_eq!(report.entity("layout").unwrap().usage, 15);
        assert_eq!(report.entity("partials.nav").unwrap().usage, 15);
        assert_eq!(report.entity("orphan").unwrap().verdict, UsageVerdict::Unused);
    }

    #[test]
    fn test_views_slashed_reference() {
        let root = setup_temp_project();
        write_file(&root.join("resources/views/emails/welcome.blade.php"), "Hi");
        write_file(&root.join("app/Mail/Welcome.php"), "$this->view('emails/welcome');");

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Views::default()))
            .unwrap();
        let welcome = report.entity("emails.welcome").unwrap();

        assert_eq!(welcome.usage, 10);
        assert_eq!(welcome.occurrences, ["app/Mail/Welcome.php"]);
    }

    #[test]
    fn test_assets_end_to_end() {
        let root = setup_temp_project();
        write_file(&root.join("public/css/app.css"), "body { margin: 0 }");
        write_file(&root.join("public/css/unused.css"), "p { color: red }");
        write_file(&root.join("public/img/logo.png"), [0x89u8, 0x50, 0x4e, 0x47, 0x00]);
        write_file(
            &root.join("resources/views/layout.blade.php"),
            "<link href=\"{{ asset('css/app.css') }}\"><img src=\"logo.png\">",
        );

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Assets::default()))
            .unwrap();

        assert_eq!(report.entity("css/app.css").unwrap().usage, 13);
        assert_eq!(report.entity("img/logo.png").unwrap().usage, 3);
        assert_eq!(
            report.entity("css/unused.css").unwrap().verdict,
            UsageVerdict::Unused
        );
        // The png is an entity but not scannable text
        assert_eq!(report.stats.files_skipped, 1);
    }

    #[test]
    fn test_missing_kind_dir_yields_empty_report() {
        let root = setup_temp_project();
        write_file(&root.join("README.md"), "nothing here");

        let report = Analyzer::new(&root)
            .analyze_kind(Arc::new(Routes::default()))
            .unwrap();
        assert_eq!(report.stats.total_entities, 0);
        assert!(!report.has_unused());
    }
}
