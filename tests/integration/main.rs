//! Integration tests for unbundle

mod support {
    use std::collections::HashMap;
    use std::fs;
    use std::io::{self, Read, Write};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use unbundle::{Locator, ResourceProvider};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Write a zip archive; names ending with `/` become directory entries
    pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(fs::File::create(path).unwrap());
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    /// Provider with a fixed name -> locator table.
    ///
    /// Counts calls and refuses to open any stream more than once, so a
    /// second extraction fails loudly.
    #[derive(Default)]
    pub struct TableProvider {
        locators: HashMap<String, Locator>,
        contents: HashMap<String, Vec<u8>>,
        pub resolves: AtomicUsize,
        pub opens: AtomicUsize,
    }

    impl TableProvider {
        pub fn locator(mut self, name: &str, locator: Locator) -> Self {
            self.locators.insert(name.to_string(), locator);
            self
        }

        pub fn stream(mut self, name: &str, spec: &str, content: &[u8]) -> Self {
            let locator = Locator::parse(spec).unwrap();
            self.contents
                .insert(locator.as_str().to_string(), content.to_vec());
            self.locator(name, locator)
        }

        pub fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }

        pub fn resolves(&self) -> usize {
            self.resolves.load(Ordering::SeqCst)
        }
    }

    impl ResourceProvider for TableProvider {
        fn resolve(&self, name: &str) -> Option<Locator> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            self.locators.get(name).cloned()
        }

        fn open_stream(&self, locator: &Locator) -> io::Result<Box<dyn Read + Send>> {
            if self.opens.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(io::Error::other("stream opened twice"));
            }
            let content = self
                .contents
                .get(locator.as_str())
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
            Ok(Box::new(io::Cursor::new(content)))
        }
    }
}

mod resolution_tests {
    use crate::support::TableProvider;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;
    use unbundle::{FileResolver, ResolverOptions};

    fn options(temp: &TempDir) -> ResolverOptions {
        ResolverOptions {
            cache_dir: Some(temp.path().join("cache")),
            cwd: Some(temp.path().join("cwd")),
            ..ResolverOptions::default()
        }
    }

    #[test]
    fn disk_wins_over_stale_cache_entry() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TableProvider::default());
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider)).unwrap();

        let cache = resolver.cache().unwrap();
        cache
            .cache_file("page.html", &mut &b"stale"[..], unbundle::Transfer::Copy)
            .unwrap();
        fs::create_dir_all(temp.path().join("cwd")).unwrap();
        fs::write(temp.path().join("cwd/page.html"), "fresh").unwrap();

        let path = resolver.resolve_file("page.html").unwrap();

        assert_eq!(path, temp.path().join("cwd/page.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "fresh");
    }

    #[test]
    fn without_cache_no_provider_calls() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TableProvider::default().stream(
            "a.txt",
            "resource:/a.txt",
            b"a",
        ));
        let options = ResolverOptions {
            provider_resolving_enabled: false,
            ..options(&temp)
        };
        let resolver = FileResolver::with_provider(&options, Some(provider.clone())).unwrap();

        let path = resolver.resolve_file("a.txt").unwrap();

        assert_eq!(path, temp.path().join("cwd/a.txt"));
        assert_eq!(provider.resolves(), 0);
        assert_eq!(provider.opens(), 0);
    }

    #[test]
    fn resolving_twice_extracts_once() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TableProvider::default().stream(
            "conf/app.toml",
            "bundleentry://12.fwk1/conf/app.toml",
            b"port = 8080",
        ));
        let resolver =
            FileResolver::with_provider(&options(&temp), Some(provider.clone())).unwrap();

        let first = resolver.resolve_file("conf/app.toml").unwrap();
        let second = resolver.resolve_file("conf/app.toml").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "port = 8080");
        assert_eq!(provider.opens(), 1);
    }

    #[test]
    fn concurrent_resolves_extract_once() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(
            TableProvider::default()
                .stream("web/", "bundle://3.0:1/web/", b"")
                .stream("web", "bundle://3.0:1/web/", b"")
                .stream("web/app.js", "bundle://3.0:1/web/app.js", b"console.log(1)"),
        );
        let resolver =
            Arc::new(FileResolver::with_provider(&options(&temp), Some(provider.clone())).unwrap());

        let paths: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let resolver = Arc::clone(&resolver);
                    scope.spawn(move || resolver.resolve_file("web/app.js").unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(provider.opens(), 1);
        for path in &paths {
            assert_eq!(path, &paths[0]);
            assert_eq!(fs::read_to_string(path).unwrap(), "console.log(1)");
        }
        assert!(resolver.cache().unwrap().get_file("web").is_dir());
    }

    #[test]
    fn restrictive_policy_blocks_unsafe_names() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TableProvider::default().stream(
            "a|b.txt",
            "resource:/a|b.txt",
            b"pipe",
        ));
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider.clone()))
            .unwrap()
            .path_policy(unbundle::PathPolicy::Restrictive);

        let path = resolver.resolve_file("a|b.txt").unwrap();

        assert_eq!(path, temp.path().join("cwd/a|b.txt"));
        assert_eq!(provider.opens(), 0);
        let cache_root = resolver.cache().unwrap().root();
        assert_eq!(fs::read_dir(cache_root).unwrap().count(), 0);
    }

    #[test]
    fn close_removes_owned_cache() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TableProvider::default().stream("a.txt", "resource:/a.txt", b"a"));
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider)).unwrap();

        let path = resolver.resolve_file("a.txt").unwrap();
        assert!(path.exists());

        resolver.close().unwrap();
        assert!(!resolver.cache().unwrap().root().exists());
    }
}

mod filesystem_tests {
    use std::fs;
    use tempfile::TempDir;
    use unbundle::{FileResolver, ResolverOptions};

    fn site(temp: &TempDir) -> std::path::PathBuf {
        let root = temp.path().join("site");
        fs::create_dir_all(root.join("web/css/themes")).unwrap();
        fs::create_dir_all(root.join("web/empty")).unwrap();
        fs::write(root.join("web/index.html"), "<html>").unwrap();
        fs::write(root.join("web/css/site.css"), "body {}").unwrap();
        fs::write(root.join("web/css/themes/dark.css"), "dark").unwrap();
        root
    }

    fn resolver(temp: &TempDir, root: &std::path::Path) -> FileResolver {
        let options = ResolverOptions {
            cache_dir: Some(temp.path().join("cache")),
            cwd: Some(temp.path().join("cwd")),
            search_path: vec![root.to_path_buf()],
            ..ResolverOptions::default()
        };
        FileResolver::new(&options).unwrap()
    }

    #[test]
    fn directory_extraction_mirrors_source_tree() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let resolver = resolver(&temp, &root);

        let web = resolver.resolve_file("web").unwrap();

        assert!(web.is_dir());
        assert!(web.starts_with(resolver.cache().unwrap().root()));
        assert_eq!(fs::read_to_string(web.join("index.html")).unwrap(), "<html>");
        assert_eq!(fs::read_to_string(web.join("css/site.css")).unwrap(), "body {}");
        assert_eq!(
            fs::read_to_string(web.join("css/themes/dark.css")).unwrap(),
            "dark"
        );
        assert!(web.join("empty").is_dir());
        // The source is left untouched
        assert!(root.join("web/index.html").exists());
    }

    #[test]
    fn resolving_a_file_unpacks_its_directory() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let resolver = resolver(&temp, &root);

        let css = resolver.resolve_file("web/css/site.css").unwrap();
        assert_eq!(fs::read_to_string(&css).unwrap(), "body {}");

        let listing: Vec<String> = fs::read_dir(css.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(listing.contains(&"site.css".to_string()));
        assert!(listing.contains(&"themes".to_string()));
    }

    #[test]
    fn caching_disabled_refreshes_from_source() {
        let temp = TempDir::new().unwrap();
        let root = site(&temp);
        let options = ResolverOptions {
            cache_dir: Some(temp.path().join("cache")),
            cwd: Some(temp.path().join("cwd")),
            file_caching_enabled: false,
            search_path: vec![root.clone()],
            ..ResolverOptions::default()
        };
        let resolver = FileResolver::new(&options).unwrap();

        let first = resolver.resolve_file("web/index.html").unwrap();
        fs::write(root.join("web/index.html"), "<html v2>").unwrap();
        let second = resolver.resolve_file("web/index.html").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(second).unwrap(), "<html v2>");
        assert!(root.join("web/index.html").exists());
    }
}

mod archive_tests {
    use crate::support::{write_zip, TableProvider};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;
    use unbundle::{FileResolver, Locator, ResolverOptions, UnbundleError};

    fn options(temp: &TempDir) -> ResolverOptions {
        ResolverOptions {
            cache_dir: Some(temp.path().join("cache")),
            cwd: Some(temp.path().join("cwd")),
            ..ResolverOptions::default()
        }
    }

    fn jar_locator(archive: &std::path::Path, entry: &str) -> Locator {
        Locator::archive_entry(archive, entry).unwrap()
    }

    #[test]
    fn extracts_subtree_under_entry_prefix() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bundle.jar");
        write_zip(
            &archive,
            &[
                ("a/b/c.txt", b"c"),
                ("a/b/d.txt", b"d"),
                ("a/other.txt", b"other"),
                ("b/outside.txt", b"outside"),
            ],
        );
        let provider = Arc::new(TableProvider::default().locator("b", jar_locator(&archive, "a!/b")));
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider)).unwrap();

        let b = resolver.resolve_file("b").unwrap();

        let cache = resolver.cache().unwrap();
        assert_eq!(b, cache.get_file("b"));
        assert_eq!(fs::read_to_string(cache.get_file("b/c.txt")).unwrap(), "c");
        assert_eq!(fs::read_to_string(cache.get_file("b/d.txt")).unwrap(), "d");
        assert!(!cache.get_file("other.txt").exists());
        assert!(!cache.get_file("b/outside.txt").exists());
    }

    #[test]
    fn search_path_archive_root() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("assets.zip");
        write_zip(
            &archive,
            &[
                ("web/", b""),
                ("web/index.html", b"<html>"),
                ("web/img/", b""),
                ("web/img/logo.svg", b"<svg/>"),
            ],
        );
        let options = ResolverOptions {
            search_path: vec![archive],
            ..options(&temp)
        };
        let resolver = FileResolver::new(&options).unwrap();

        let index = resolver.resolve_file("web/index.html").unwrap();
        assert_eq!(fs::read_to_string(&index).unwrap(), "<html>");

        // The parent directory was extracted as a whole
        let web = index.parent().unwrap();
        assert!(web.join("img").is_dir());
        assert_eq!(fs::read_to_string(web.join("img/logo.svg")).unwrap(), "<svg/>");
    }

    #[test]
    fn uppercase_archive_root_extracts() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ASSETS.ZIP");
        write_zip(&archive, &[("web/", b""), ("web/index.html", b"<html>")]);
        let options = ResolverOptions {
            search_path: vec![archive],
            ..options(&temp)
        };
        let resolver = FileResolver::new(&options).unwrap();

        let index = resolver.resolve_file("web/index.html").unwrap();

        assert_eq!(index, resolver.cache().unwrap().get_file("web/index.html"));
        assert_eq!(fs::read_to_string(&index).unwrap(), "<html>");
    }

    #[test]
    fn nested_archive_resolves_outer_first() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("inner.zip");
        write_zip(&inner, &[("x/", b""), ("x/y.txt", b"nested")]);
        let outer = temp.path().join("outer.jar");
        write_zip(&outer, &[("lib/inner.zip", &fs::read(&inner).unwrap())]);
        fs::remove_file(&inner).unwrap();

        let inner_locator = jar_locator(&outer, "lib/inner.zip");
        let provider = Arc::new(
            TableProvider::default()
                .locator("lib/inner.zip", inner_locator.clone())
                .locator(
                    "x",
                    Locator::parse(format!("{}!/x", inner_locator)).unwrap(),
                )
                .locator(
                    "x/y.txt",
                    Locator::parse(format!("{}!/x/y.txt", inner_locator)).unwrap(),
                ),
        );
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider)).unwrap();

        let y = resolver.resolve_file("x/y.txt").unwrap();

        let cache = resolver.cache().unwrap();
        assert_eq!(y, cache.get_file("x/y.txt"));
        assert_eq!(fs::read_to_string(&y).unwrap(), "nested");
        assert!(cache.get_file("lib/inner.zip").is_file());
    }

    #[test]
    fn corrupt_archive_is_reported() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.jar");
        fs::write(&archive, "definitely not a zip").unwrap();
        let provider = Arc::new(
            TableProvider::default().locator("a.txt", jar_locator(&archive, "a.txt")),
        );
        let resolver = FileResolver::with_provider(&options(&temp), Some(provider)).unwrap();

        let err = resolver.resolve_file("a.txt").unwrap_err();
        assert!(matches!(err, UnbundleError::Archive { .. }));
    }
}
