//! Resolution of the `auth-service` fixture against its on-disk repository.

use camino::{Utf8Path, Utf8PathBuf};
use manifold_descriptor::{Descriptor, load_from_root};
use manifold_resolve::{
    FsRepository, RepositoryChain, Resolution, Resolver, check_locked, lockfile_from,
    lockfile_json,
};
use manifold_types::{Classpath, Coordinate};
use pretty_assertions::assert_eq;

fn fixture_root() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../tests/fixtures/auth-service")
}

fn resolve_fixture() -> (Descriptor, Resolution) {
    let root = fixture_root();
    let descriptor = load_from_root(&root).expect("load fixture descriptor");
    let mut chain = RepositoryChain::new();
    for (name, path) in descriptor.repository_roots(&root) {
        chain.push(FsRepository::new(name, path));
    }
    let resolution = Resolver::new(&chain, &descriptor)
        .resolve()
        .expect("resolve fixture");
    (descriptor, resolution)
}

fn names(res: &Resolution, cp: Classpath) -> Vec<String> {
    res.classpath(cp).iter().map(Coordinate::to_string).collect()
}

#[test]
fn compile_classpath_includes_compile_only_and_inherited_processor() {
    let (_, res) = resolve_fixture();
    assert_eq!(
        names(&res, Classpath::Compile),
        vec![
            "org.mongodb:mongodb-driver-sync:5.6.2",
            "org.projectlombok:lombok:1.18.42",
            "org.springframework:spring-core:7.0.3",
            "org.springframework:spring-webmvc:7.0.3",
            "org.springframework.boot:spring-boot-starter:4.0.2",
            "org.springframework.boot:spring-boot-starter-data-mongodb:4.0.2",
            "org.springframework.boot:spring-boot-starter-webmvc:4.0.2",
            "org.springframework.data:spring-data-mongodb:5.0.2",
        ]
    );
}

#[test]
fn runtime_classpath_drops_compile_only_and_adds_runtime_transitives() {
    let (_, res) = resolve_fixture();
    let runtime = names(&res, Classpath::Runtime);
    assert!(!runtime.iter().any(|c| c.contains("lombok")));
    assert!(runtime.contains(&"org.apache.tomcat.embed:tomcat-embed-core:11.0.15".to_string()));
    assert!(!runtime.iter().any(|c| c.contains("docker-compose")));
    assert!(
        !names(&res, Classpath::Compile)
            .iter()
            .any(|c| c.contains("tomcat"))
    );
}

#[test]
fn conflicting_transitives_take_highest_version() {
    let (_, res) = resolve_fixture();
    for cp in Classpath::ALL {
        let spring_core: Vec<String> = names(&res, cp)
            .into_iter()
            .filter(|c| c.contains(":spring-core:"))
            .collect();
        if !spring_core.is_empty() {
            assert_eq!(spring_core, vec!["org.springframework:spring-core:7.0.3"], "{cp}");
        }
    }
    let starter: Coordinate = "org.springframework.boot:spring-boot-starter:4.0.2".parse().unwrap();
    assert_eq!(
        res.packages[&starter].dependencies,
        vec!["org.springframework:spring-core:7.0.3".parse::<Coordinate>().unwrap()]
    );
}

#[test]
fn development_and_test_classpaths() {
    let (_, res) = resolve_fixture();
    let dev = names(&res, Classpath::Development);
    assert!(dev.contains(&"org.springframework.boot:spring-boot-docker-compose:4.0.2".to_string()));

    let test_runtime = names(&res, Classpath::TestRuntime);
    for expected in [
        "org.junit.jupiter:junit-jupiter:6.0.2",
        "org.junit.platform:junit-platform-launcher:6.0.2",
        "org.springframework.boot:spring-boot-starter-webmvc-test:4.0.2",
    ] {
        assert!(test_runtime.contains(&expected.to_string()), "{expected}");
    }
    assert!(
        !names(&res, Classpath::TestCompile)
            .iter()
            .any(|c| c.contains("junit-platform-launcher"))
    );
    assert_eq!(
        names(&res, Classpath::AnnotationProcessor),
        vec!["org.projectlombok:lombok:1.18.42"]
    );
}

#[test]
fn lockfile_records_artifacts_and_is_fresh() {
    let (descriptor, res) = resolve_fixture();
    let lock = lockfile_from(&descriptor, &res);
    let lombok = lock
        .packages
        .iter()
        .find(|p| p.coordinate.artifact == "lombok")
        .expect("lombok locked");
    assert_eq!(lombok.repository, "local");
    assert!(
        lombok
            .artifact
            .as_ref()
            .is_some_and(|p| p.as_str().ends_with("lombok-1.18.42.jar"))
    );
    assert_eq!(lock.artifact_paths(Classpath::AnnotationProcessor).len(), 1);
    assert_eq!(lock.plugins.len(), 3);

    let json = lockfile_json(&lock).unwrap();
    assert!(json.ends_with("}\n"));
    check_locked(Some(lock), &descriptor).expect("fresh lock");
}

#[test]
fn resolution_is_repeatable() {
    let (descriptor, first) = resolve_fixture();
    let (_, second) = resolve_fixture();
    assert_eq!(
        lockfile_json(&lockfile_from(&descriptor, &first)).unwrap(),
        lockfile_json(&lockfile_from(&descriptor, &second)).unwrap()
    );
}
