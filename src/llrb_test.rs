use std::cell::Cell;
use std::cmp::Ordering;
use std::ops::Bound;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use simplelog::{Config, LevelFilter, TestLogger};

use crate::error::Error;
use crate::llrb::Llrb;
use crate::Compare;

fn init_logger() {
    // logger may already be set by an earlier test.
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

#[test]
fn test_id() {
    let llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    assert_eq!(llrb.id(), "test-llrb".to_string());
}

#[test]
fn test_len() {
    let llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    assert_eq!(llrb.len(), 0);
    assert!(llrb.is_empty());
}

#[test]
fn test_empty() {
    init_logger();
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");

    assert_eq!(llrb.len(), 0);
    assert_eq!(llrb.min(), None);
    assert_eq!(llrb.max(), None);
    assert_eq!(llrb.height(), -1);
    assert_eq!(llrb.get(&1), None);
    assert_eq!(llrb.floor(&1), None);
    assert_eq!(llrb.ceiling(&1), None);
    assert_eq!(llrb.select(0), None);
    assert_eq!(llrb.rank(&1), 0);
    assert!(llrb.keys(&0, &10).is_empty());
    assert!(llrb.key_set().is_empty());
    assert!(llrb.iter().next().is_none());

    assert_eq!(llrb.remove(&1), None);
    assert_eq!(llrb.delete_min(), None);
    assert_eq!(llrb.delete_max(), None);
    assert!(llrb.is_empty());

    let stats = llrb.validate().unwrap();
    assert_eq!(stats.entries(), 0);
    assert_eq!(stats.blacks(), Some(0));
}

#[test]
fn test_create() {
    init_logger();
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(10);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(llrb.create(*key, 10).is_ok());
        assert!(refns.create(*key, 10));
    }

    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    // error case
    assert_eq!(llrb.create(7, 20), Err(Error::OverwriteKey));
    assert_eq!(llrb.get(&7), Some(10));
    assert_eq!(llrb.len(), 10);

    // test get
    for i in 0..10 {
        let val = llrb.get(&i);
        let refval = refns.get(i);
        assert_eq!(val, refval);
    }
    // test iter
    let (mut iter, mut iter_ref) = (llrb.iter(), refns.iter());
    loop {
        match (iter.next(), iter_ref.next()) {
            (Some(item), Some(ref_item)) => {
                assert_eq!(item.0, ref_item.0);
                assert_eq!(item.1, ref_item.1);
            }
            (None, None) => break,
            (_, _) => panic!("invalid"),
        }
    }
}

#[test]
fn test_put() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(10);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(llrb.put(*key, 10).is_none());
        refns.put(*key, 10);
    }

    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    // overwrite keeps the shape.
    let (height, keys) = (llrb.height(), llrb.key_set());
    assert_eq!(llrb.put(5, 50), Some(10));
    refns.put(5, 50);
    assert_eq!(llrb.len(), 10);
    assert_eq!(llrb.height(), height);
    assert_eq!(llrb.key_set(), keys);

    // test get
    for i in 0..10 {
        let val = llrb.get(&i);
        let refval = refns.get(i);
        assert_eq!(val, refval);
        assert!(llrb.contains(&i));
    }
    assert!(!llrb.contains(&10));
    assert_eq!(
        llrb.value_set(),
        refns.iter().map(|(_, v)| v).collect::<Vec<i64>>()
    );
}

#[test]
fn test_remove() {
    init_logger();
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(11);

    for key in [2, 1, 3, 6, 5, 4, 8, 0, 9, 7].iter() {
        assert!(llrb.put(*key, 100).is_none());
        refns.put(*key, 100);
    }

    // delete a missing node.
    assert!(llrb.remove(&10).is_none());
    assert!(refns.remove(10).is_none());

    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    // delete all entry.
    for i in 0..10 {
        let val = llrb.remove(&i);
        let refval = refns.remove(i);
        assert_eq!(val, refval);
        assert!(!llrb.contains(&i));
        assert!(llrb.validate().is_ok());
    }
    assert_eq!(llrb.len(), 0);
    assert!(llrb.validate().is_ok());
    assert!(llrb.iter().next().is_none());
}

#[test]
fn test_remove_ascending() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in 0..100 {
        llrb.put(key, key);
    }

    for key in 0..100 {
        let n = llrb.len();
        assert_eq!(llrb.remove(&key), Some(key));
        assert_eq!(llrb.len(), n - 1);
        let stats = llrb.validate().unwrap();
        assert_eq!(stats.entries(), llrb.key_set().len());
    }
    assert!(llrb.is_empty());
    assert_eq!(llrb.height(), -1);
}

#[test]
fn test_remove_descending() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in 0..100 {
        llrb.put(key, key);
    }
    for key in (0..100).rev() {
        assert_eq!(llrb.remove(&key), Some(key));
        assert!(llrb.validate().is_ok());
    }
    assert!(llrb.is_empty());
}

#[test]
fn test_delete_min_max() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in 0..200 {
        llrb.put(key, key * 10);
    }

    let (mut low, mut high) = (0, 199);
    while !llrb.is_empty() {
        assert_eq!(llrb.delete_min(), Some((low, low * 10)));
        assert!(llrb.validate().is_ok());
        low += 1;
        if llrb.is_empty() {
            break;
        }
        assert_eq!(llrb.delete_max(), Some((high, high * 10)));
        assert!(llrb.validate().is_ok());
        high -= 1;
        assert_eq!(llrb.len() as i64, high - low + 1);
        if !llrb.is_empty() {
            assert_eq!(llrb.min(), Some(low));
            assert_eq!(llrb.max(), Some(high));
        }
    }
    assert_eq!(llrb.delete_min(), None);
    assert_eq!(llrb.delete_max(), None);
}

#[test]
fn test_order_queries() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in [5, 3, 8, 1, 4, 7, 9].iter() {
        llrb.put(*key, key * 10);
    }

    assert_eq!(llrb.min(), Some(1));
    assert_eq!(llrb.max(), Some(9));
    assert_eq!(llrb.select(3), Some(5));
    assert_eq!(llrb.select(7), None);
    assert_eq!(llrb.rank(&7), 4);
    assert_eq!(llrb.rank(&6), 4);
    assert_eq!(llrb.rank(&0), 0);
    assert_eq!(llrb.rank(&100), 7);
    assert_eq!(llrb.keys(&3, &8), vec![3, 4, 5, 7, 8]);
    assert_eq!(llrb.values(&3, &8), vec![30, 40, 50, 70, 80]);
    assert_eq!(llrb.keys(&8, &3), Vec::<i64>::new());
    assert_eq!(llrb.floor(&6), Some(5));
    assert_eq!(llrb.floor(&0), None);
    assert_eq!(llrb.ceiling(&6), Some(7));
    assert_eq!(llrb.ceiling(&10), None);
    assert_eq!(llrb.key_set(), vec![1, 3, 4, 5, 7, 8, 9]);
}

#[test]
fn test_floor_ceiling_str() {
    let mut llrb: Llrb<&str, i64> = Llrb::new("test-llrb");
    llrb.put("b", 1);
    llrb.put("a", 2);
    llrb.put("c", 3);

    assert_eq!(llrb.floor(&"b"), Some("b"));
    assert_eq!(llrb.ceiling(&"b"), Some("b"));
    assert_eq!(llrb.floor(&"a0"), Some("a"));
    assert_eq!(llrb.ceiling(&"a0"), Some("b"));
    assert_eq!(llrb.ceiling(&"c0"), None);
}

#[test]
fn test_height_bound() {
    let seed = make_seed();
    println!("test_height_bound seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut llrb: Llrb<u64, u64> = Llrb::new("test-llrb");
    while llrb.len() < 1000 {
        llrb.put(rng.gen::<u64>(), 0);
        let n = llrb.len() as f64;
        let bound = 2.0 * (n + 1.0).log2();
        assert!((llrb.height() as f64) <= bound, "{} {}", llrb.height(), n);
    }
    let stats = llrb.validate().unwrap();
    let depths = stats.depths().unwrap();
    assert_eq!(depths.samples(), 1001);
    assert!(depths.max() as isize == llrb.height() + 1);
}

#[test]
fn test_rank_select() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in (0..500).map(|k| k * 3) {
        llrb.put(key, key);
    }
    for i in 0..llrb.len() {
        let key = llrb.select(i).unwrap();
        assert_eq!(key, (i as i64) * 3);
        assert_eq!(llrb.rank(&key), i);
    }
    assert_eq!(llrb.select(llrb.len()), None);
}

#[test]
fn test_custom_cmp() {
    let cmp = |a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase());
    let mut llrb = Llrb::with_cmp("test-llrb", cmp);

    assert_eq!(llrb.put("Bogota".to_string(), 1), None);
    assert_eq!(llrb.put("medellin".to_string(), 2), None);
    assert_eq!(llrb.put("CALI".to_string(), 3), None);
    assert_eq!(llrb.put("bogota".to_string(), 4), Some(1));

    assert_eq!(llrb.len(), 3);
    assert_eq!(llrb.get(&"BOGOTA".to_string()), Some(4));
    assert_eq!(
        llrb.key_set(),
        vec!["Bogota".to_string(), "CALI".to_string(), "medellin".to_string()]
    );
    assert!(llrb.validate().is_ok());

    let mut llrb = Llrb::with_cmp("test-llrb", crate::natural().rev());
    for key in 0..10_i64 {
        llrb.put(key, key);
    }
    assert_eq!(llrb.min(), Some(9));
    assert_eq!(llrb.select(0), Some(9));
    assert_eq!(llrb.keys(&7, &4), vec![7, 6, 5, 4]);
    assert!(llrb.cmp().compares_gt(&1, &2));
    assert!(llrb.validate().is_ok());
}

#[test]
fn test_validate_sort_error() {
    init_logger();
    let reversed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&reversed);
    let cmp = move |a: &i64, b: &i64| -> Ordering {
        if flag.get() {
            b.cmp(a)
        } else {
            a.cmp(b)
        }
    };
    let mut llrb = Llrb::with_cmp("test-llrb", cmp);
    for key in 0..10 {
        llrb.put(key, key);
    }
    assert!(llrb.validate().is_ok());

    reversed.set(true);
    match llrb.validate() {
        Err(Error::SortError(_, _)) => (),
        Err(err) => panic!("unexpected error {}", err),
        Ok(_) => panic!("expected sort error"),
    }
}

#[test]
fn test_load_from() {
    let items = vec![(3, 30), (1, 10), (2, 20), (1, 11)];
    let llrb: Llrb<i64, i64> = Llrb::load_from("test-llrb", items.into_iter());
    assert_eq!(llrb.len(), 3);
    assert_eq!(llrb.get(&1), Some(11));
    assert!(llrb.validate().is_ok());
}

#[test]
fn test_stats() {
    let llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let stats = llrb.stats();
    assert_eq!(stats.entries(), 0);
    assert_eq!(stats.blacks(), None);
    assert!(stats.depths().is_none());

    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    for key in 0..1000 {
        llrb.put(key, key);
    }
    let stats = llrb.validate().unwrap();
    assert_eq!(stats.entries(), 1000);
    assert!(stats.blacks().unwrap() > 0);
    let depths = stats.depths().unwrap();
    assert!(depths.min() <= depths.mean() && depths.mean() <= depths.max());
    depths.pretty_print("test-llrb ");
}

#[test]
fn test_crud() {
    init_logger();
    let size = 1000;
    let seed = make_seed();
    println!("test_crud seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(size);

    for _ in 0..20_000 {
        let key: i64 = (rng.gen::<u64>() % (size as u64)) as i64;
        let value: i64 = rng.gen();
        let op: u8 = rng.gen::<u8>() % 8;
        match op {
            0 => {
                let ok1 = llrb.create(key, value).is_ok();
                let ok2 = refns.create(key, value);
                assert_eq!(ok1, ok2);
            }
            1 | 2 => {
                let val = llrb.put(key, value);
                let refval = refns.put(key, value);
                assert_eq!(val, refval);
            }
            3 => {
                let val = llrb.remove(&key);
                let refval = refns.remove(key);
                assert_eq!(val, refval);
            }
            4 => {
                let val = llrb.get(&key);
                let refval = refns.get(key);
                assert_eq!(val, refval);
            }
            5 => {
                assert_eq!(llrb.floor(&key), refns.floor(key));
                assert_eq!(llrb.ceiling(&key), refns.ceiling(key));
            }
            6 => {
                assert_eq!(llrb.rank(&key), refns.rank(key));
                let index = key as usize % (llrb.len() + 1);
                assert_eq!(llrb.select(index), refns.select(index));
            }
            7 => {
                let high = (rng.gen::<u64>() % (size as u64)) as i64;
                assert_eq!(llrb.keys(&key, &high), refns.keys(key, high));
            }
            op => panic!("unreachable {}", op),
        };

        assert_eq!(llrb.len(), refns.len());
        assert!(llrb.validate().is_ok());
    }

    println!("index-length {}", llrb.len());

    // test iter
    let (mut iter, mut iter_ref) = (llrb.iter(), refns.iter());
    loop {
        match (iter.next(), iter_ref.next()) {
            (Some(item), Some(ref_item)) => {
                assert_eq!(item.0, ref_item.0);
                assert_eq!(item.1, ref_item.1);
            }
            (None, None) => break,
            (_, _) => panic!("invalid"),
        }
    }

    // ranges and reverses
    for _ in 0..1_000 {
        let (low, high) = random_low_high(&mut rng, size);

        let mut iter = llrb.range((low, high));
        let mut iter_ref = refns.range(low, high);
        loop {
            match (iter.next(), iter_ref.next()) {
                (Some(item), Some(ref_item)) => {
                    assert_eq!(item.0, ref_item.0);
                    assert_eq!(item.1, ref_item.1);
                }
                (None, None) => break,
                (Some(item), None) => panic!("invalid item: {:?}", item),
                (None, Some(ref_item)) => panic!("invalid none: {:?}", ref_item),
            }
        }

        let mut iter = llrb.range((low, high)).rev();
        let mut iter_ref = refns.reverse(low, high);
        loop {
            match (iter.next(), iter_ref.next()) {
                (Some(item), Some(ref_item)) => {
                    assert_eq!(item.0, ref_item.0);
                    assert_eq!(item.1, ref_item.1);
                }
                (None, None) => break,
                (_, _) => panic!("invalid"),
            }
        }
    }

    // drain in random order.
    let mut keys = llrb.key_set();
    while !keys.is_empty() {
        let key = keys.swap_remove(rng.gen::<usize>() % keys.len());
        assert_eq!(llrb.remove(&key), refns.remove(key));
        assert!(llrb.validate().is_ok());
    }
    assert!(llrb.is_empty());
}

fn make_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

include!("./ref_test.rs");
