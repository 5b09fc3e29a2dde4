use std::{cell::RefCell, rc::Rc};

use drake_ngin::pool::Pool;

#[derive(Debug, PartialEq)]
struct Puff {
    index: usize,
    in_flight: bool,
}

fn puff_pool(capacity: usize) -> Pool<Puff> {
    Pool::new(
        capacity,
        |index| Puff {
            index,
            in_flight: false,
        },
        |puff| puff.in_flight = false,
    )
}

#[test]
fn pool_starts_full_and_drains_to_exhaustion() {
    let mut pool = puff_pool(3);
    assert_eq!(pool.available(), 3);
    assert_eq!(pool.capacity(), 3);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    let c = pool.acquire().unwrap();
    assert_ne!(a.index, b.index);
    assert_ne!(b.index, c.index);
    assert_eq!(pool.available(), 0);
    assert!(pool.acquire().is_none());
}

#[test]
fn release_resets_the_object_before_reuse() {
    let mut pool = puff_pool(1);
    let mut puff = pool.acquire().unwrap();
    puff.in_flight = true;
    pool.release(puff);

    assert_eq!(pool.available(), 1);
    let puff = pool.acquire().unwrap();
    assert!(!puff.in_flight);
}

#[test]
fn capacity_is_stable_across_churn() {
    let mut pool = puff_pool(4);
    for _ in 0..10 {
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.release(a);
        pool.release(b);
    }
    assert_eq!(pool.available(), 4);
}

#[test]
fn reset_callback_runs_on_every_release() {
    let resets = Rc::new(RefCell::new(0));
    let counter = resets.clone();
    let mut pool = Pool::new(2, |index| index, move |_| *counter.borrow_mut() += 1);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    pool.release(a);
    pool.release(b);
    assert_eq!(*resets.borrow(), 2);
}
