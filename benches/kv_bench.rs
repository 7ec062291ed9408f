use criterion::{criterion_group, criterion_main, Criterion};
use jotdb::{
  option::Options,
  store::Store,
  util::rand_kv::{get_test_key, get_test_value},
};
use rand::Rng;
use std::path::PathBuf;

fn bench_put(c: &mut Criterion) {
  let mut option = Options::default();
  option.dir_path = PathBuf::from("/tmp/jotdb-bench/put-bench");
  if !option.dir_path.is_dir() {
    std::fs::create_dir_all(&option.dir_path).unwrap();
  }
  let store = Store::open(option).unwrap();

  let mut rnd = rand::rng();

  c.bench_function("jotdb-put-bench", |b| {
    b.iter(|| {
      let i = rnd.random_range(0..u32::MAX) as usize;
      let res = store.put("bench", &get_test_key(i), get_test_value(i));
      assert!(res.is_ok());
    })
  });

  std::fs::remove_dir_all("/tmp/jotdb-bench/put-bench").unwrap();
}

fn bench_get(c: &mut Criterion) {
  let mut option = Options::default();
  option.dir_path = PathBuf::from("/tmp/jotdb-bench/get-bench");
  if !option.dir_path.is_dir() {
    std::fs::create_dir_all(&option.dir_path).unwrap();
  }
  let store = Store::open(option).unwrap();

  for i in 0..100000 {
    let res = store.put("bench", &get_test_key(i), get_test_value(i));
    assert!(res.is_ok());
  }

  let mut rnd = rand::rng();

  c.bench_function("jotdb-get-bench", |b| {
    b.iter(|| {
      let i = rnd.random_range(0..u32::MAX) as usize;

      let res = store.get("bench", &get_test_key(i));
      if (0..100000).contains(&i) {
        assert!(res.is_some());
      } else {
        assert!(res.is_none());
      }
    })
  });

  std::fs::remove_dir_all("/tmp/jotdb-bench/get-bench").unwrap();
}

fn bench_list(c: &mut Criterion) {
  let mut option = Options::default();
  option.dir_path = PathBuf::from("/tmp/jotdb-bench/list-bench");
  if !option.dir_path.is_dir() {
    std::fs::create_dir_all(&option.dir_path).unwrap();
  }
  let store = Store::open(option).unwrap();

  for i in 0..100000 {
    let res = store.put("bench", &get_test_key(i), get_test_value(i));
    assert!(res.is_ok());
  }

  c.bench_function("jotdb-list-bench", |b| {
    b.iter(|| {
      let mut sink = Vec::new();
      let res = store.list_to(&Default::default(), &mut sink);
      assert!(res.is_ok());
    })
  });

  std::fs::remove_dir_all("/tmp/jotdb-bench/list-bench").unwrap();
}

fn bench_stat(c: &mut Criterion) {
  let mut option = Options::default();
  option.dir_path = PathBuf::from("/tmp/jotdb-bench/stat-bench");
  if !option.dir_path.is_dir() {
    std::fs::create_dir_all(&option.dir_path).unwrap();
  }
  let store = Store::open(option).unwrap();

  for i in 0..100000 {
    let res = store.put("bench", &get_test_key(i), get_test_value(i));
    assert!(res.is_ok());
  }

  c.bench_function("jotdb-stat-bench", |b| {
    b.iter(|| {
      let res = store.stat();
      assert!(res.is_ok());
    })
  });

  std::fs::remove_dir_all("/tmp/jotdb-bench/stat-bench").unwrap();
}

criterion_group!(benches, bench_get, bench_put, bench_list, bench_stat);
criterion_main!(benches);
