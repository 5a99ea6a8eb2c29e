//! Many handles on one key from several threads

use std::thread;

use redisugar::{RList, RSet, Sugar};

#[test]
#[ignore]
fn stress_concurrent_appends_are_all_kept() {
    let sugar = Sugar::in_memory();
    let workers: Vec<_> = (0..8)
        .map(|w| {
            let list = RList::new(&sugar, "shared");
            thread::spawn(move || {
                for i in 0..500 {
                    list.append(format!("{}-{}", w, i)).unwrap();
                }
            })
        })
        .collect();
    for handle in workers {
        handle.join().unwrap();
    }
    assert_eq!(RList::new(&sugar, "shared").len().unwrap(), 8 * 500);
}

#[test]
#[ignore]
fn stress_concurrent_set_adds_deduplicate() {
    let sugar = Sugar::in_memory();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let set = RSet::new(&sugar, "members");
            thread::spawn(move || {
                for i in 0..1000 {
                    set.add(i).unwrap();
                }
            })
        })
        .collect();
    for handle in workers {
        handle.join().unwrap();
    }
    assert_eq!(RSet::new(&sugar, "members").len().unwrap(), 1000);
}
