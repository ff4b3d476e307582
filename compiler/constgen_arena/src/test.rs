use proptest::{prelude::any, prop_assert_eq, proptest};

use crate::{Arena, ID};

#[test]
fn insert_and_get() {
    let mut arena = Arena::<&str>::new();

    let first = arena.insert("first");
    let second = arena.insert("second");

    assert_ne!(first, second);
    assert_eq!(arena.get(first), Some(&"first"));
    assert_eq!(arena.get(second), Some(&"second"));
    assert_eq!(arena.get(ID::new(2)), None);
    assert_eq!(arena.len(), 2);
}

#[test]
fn handles_display_their_index() {
    let mut arena = Arena::<u32>::new();
    arena.insert(5);
    let id = arena.insert(7);

    assert_eq!(id.to_string(), "#1");
    assert_eq!(arena.entries().map(|(id, _)| id).collect::<Vec<_>>(), vec![ID::new(0), id]);
}

proptest! {
    #[test]
    fn ids_follow_insertion_order(items in proptest::collection::vec(any::<u32>(), 0..64)) {
        let mut arena = Arena::<u32>::new();
        let ids = items.iter().map(|item| arena.insert(*item)).collect::<Vec<_>>();

        for (index, (id, item)) in ids.iter().zip(&items).enumerate() {
            prop_assert_eq!(id.index(), index);
            prop_assert_eq!(arena.get(*id), Some(item));
        }

        prop_assert_eq!(arena.entries().map(|(_, item)| *item).collect::<Vec<_>>(), items);
    }
}
