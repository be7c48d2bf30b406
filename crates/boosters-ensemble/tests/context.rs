//! Handle semantics of [`Context`]: rehydration, release, and misuse.

use std::thread;

use rstest::rstest;

use boosters_ensemble::testing::{assert_same_ensemble, sample_ensemble, stump};
use boosters_ensemble::{Context, DecisionStump, EnsembleError, ModelState, Released};

#[test]
fn handle_lifecycle() {
    let mut ctx = Context::new();
    let handle = ctx.create_model().unwrap();

    ctx.add_weak_learner(handle, stump(0, 0.5)).unwrap();
    ctx.add_weighted_learner(handle, stump(1, 1.5), 0.25).unwrap();
    assert_eq!(ctx.number_of_weak_learners(handle).unwrap(), 2);
    assert_eq!(ctx.weight(handle, 1).unwrap(), 0.25);

    ctx.finalize(handle).unwrap();
    assert!(matches!(
        ctx.add_weak_learner(handle, stump(2, 0.5)),
        Err(EnsembleError::InvalidState { state: ModelState::Finalized, .. })
    ));

    let second = ctx.get_weak_learner(handle, 1).unwrap();
    assert_eq!(second.downcast_ref::<DecisionStump>().unwrap().feature(), 1);
}

#[rstest]
#[case(-1)]
#[case(i64::MIN)]
#[case(3)]
#[case(i64::MAX)]
fn out_of_range_signed_index(#[case] index: i64) {
    let mut ctx = Context::new();
    let handle = ctx.adopt(sample_ensemble(3)).unwrap();

    let err = ctx.get_weak_learner(handle, index).unwrap_err();
    assert!(
        matches!(err, EnsembleError::OutOfRange { index: i, count: 3 } if i == index),
        "got: {err:?}"
    );
}

#[test]
fn serialize_and_deserialize_through_handles() {
    let mut ctx = Context::new();
    let original = ctx.adopt(sample_ensemble(4)).unwrap();
    let bytes = ctx.serialize(original).unwrap();

    let copy = ctx.deserialize(&bytes).unwrap();
    assert_ne!(copy, original);
    assert!(ctx.model(copy).unwrap().is_finalized());
    assert_same_ensemble(ctx.model(copy).unwrap(), ctx.model(original).unwrap());
    assert_eq!(ctx.len(), 2);
}

#[test]
fn load_into_is_all_or_nothing() {
    let mut ctx = Context::new();
    let handle = ctx.adopt(sample_ensemble(2)).unwrap();
    let before = ctx.serialize(handle).unwrap();

    let mut corrupt = sample_ensemble(5).serialize().unwrap();
    corrupt.truncate(corrupt.len() - 1);
    assert!(matches!(
        ctx.load_into(handle, &corrupt),
        Err(EnsembleError::CorruptData(_))
    ));
    assert_eq!(ctx.serialize(handle).unwrap(), before);
    assert_eq!(ctx.model(handle).unwrap().state(), ModelState::Building);

    let replacement = sample_ensemble(5).serialize().unwrap();
    ctx.load_into(handle, &replacement).unwrap();
    assert_eq!(ctx.number_of_weak_learners(handle).unwrap(), 5);
    assert!(ctx.model(handle).unwrap().is_finalized());
}

#[test]
fn rehydrate_returns_the_same_handle() {
    let mut ctx = Context::new();
    let handles: Vec<_> = (0..4).map(|_| ctx.create_model().unwrap()).collect();

    for handle in handles {
        let raw = handle.raw();
        assert_eq!(ctx.rehydrate(raw).unwrap(), handle);
    }
}

#[test]
fn stale_handle_is_use_after_release() {
    let mut ctx = Context::new();
    let handle = ctx.create_model().unwrap();
    ctx.release_model(handle).unwrap();

    // The slot is reused, but the old handle stays dead.
    let _reused = ctx.create_model().unwrap();
    for result in [
        ctx.number_of_weak_learners(handle).map(drop),
        ctx.rehydrate(handle.raw()).map(drop),
        ctx.release_model(handle),
    ] {
        assert!(
            matches!(
                result,
                Err(EnsembleError::UseAfterRelease(Released::Model(h))) if h == handle
            ),
            "got: {result:?}"
        );
    }
}

#[test]
fn released_context_rejects_everything() {
    let mut ctx = Context::new();
    let handle = ctx.adopt(sample_ensemble(3)).unwrap();
    let id = ctx.id();

    ctx.release();
    ctx.release();
    assert!(ctx.is_released());
    assert!(ctx.is_empty());
    assert!(ctx.handles().is_empty());

    let is_context_release = |err: EnsembleError| {
        matches!(err, EnsembleError::UseAfterRelease(Released::Context(c)) if c == id)
    };
    assert!(is_context_release(ctx.number_of_weak_learners(handle).unwrap_err()));
    assert!(is_context_release(ctx.create_model().unwrap_err()));
    assert!(is_context_release(ctx.rehydrate(handle.raw()).unwrap_err()));
    assert!(is_context_release(ctx.deserialize(&[]).unwrap_err()));
}

#[test]
fn foreign_handles_are_rejected() {
    let mut a = Context::new();
    let mut b = Context::new();
    let handle = a.create_model().unwrap();
    b.create_model().unwrap();

    let err = b.number_of_weak_learners(handle).unwrap_err();
    assert!(
        matches!(
            err,
            EnsembleError::ForeignHandle { handle: h, context } if h == handle && context == b.id()
        ),
        "got: {err:?}"
    );
}

#[test]
fn raw_handles_stay_bound_to_their_context() {
    let mut a = Context::new();
    let mut b = Context::new();
    let handle = a.create_model().unwrap();
    a.add_weak_learner(handle, stump(0, 0.5)).unwrap();
    // Same slot and generation as `handle`, in a different context.
    let other = b.create_model().unwrap();
    assert_ne!(handle.raw(), other.raw());

    let err = b.rehydrate(handle.raw()).unwrap_err();
    assert!(
        matches!(
            err,
            EnsembleError::ForeignHandle { handle: h, context } if h == handle && context == b.id()
        ),
        "got: {err:?}"
    );
    assert_eq!(b.number_of_weak_learners(other).unwrap(), 0);
    assert_eq!(a.rehydrate(handle.raw()).unwrap(), handle);
}

#[test]
fn unknown_raw_values_are_rejected() {
    let mut ctx = Context::new();
    ctx.create_model().unwrap();

    let base = u128::from(ctx.id().get()) << 64;
    for raw in [base, base | 1, base | u128::from(u64::MAX), base | (1 << 32) | 5] {
        assert!(
            matches!(
                ctx.rehydrate(raw),
                Err(EnsembleError::UnknownHandle { raw: r, .. }) if r == raw
            ),
            "raw {raw:#x}"
        );
    }
}

#[test]
fn finalized_models_are_shared_across_threads() {
    let mut ctx = Context::new();
    let handle = ctx.adopt(sample_ensemble(16)).unwrap();
    ctx.finalize(handle).unwrap();

    let ctx = &ctx;
    let expected = ctx.model(handle).unwrap().predict_row(&[0.5, 1.0, 1.5, 2.0]);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(move || {
                let model = ctx.model(handle).unwrap();
                for i in 0..model.number_of_weak_learners() {
                    ctx.get_weak_learner(handle, i as i64).unwrap();
                }
                assert_eq!(model.predict_row(&[0.5, 1.0, 1.5, 2.0]), expected);
            });
        }
    });
}

#[test]
fn take_hands_model_back_to_caller() {
    let mut ctx = Context::new();
    let handle = ctx.adopt(sample_ensemble(3)).unwrap();

    let model = ctx.take(handle).unwrap();
    assert_same_ensemble(&model, &sample_ensemble(3));
    assert!(matches!(
        ctx.model(handle),
        Err(EnsembleError::UseAfterRelease(Released::Model(_)))
    ));
}
