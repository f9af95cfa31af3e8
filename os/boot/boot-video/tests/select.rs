use boot_video::{
    Candidates, ModeInfo, ModeInfoProvider, RankedModes, SelectError, SelectorConfig, VideoMode,
    select_video_mode,
};
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq)]
struct QueryFailed;

/// Provider backed by a fixed mode list; can be told to fail individual queries.
#[derive(Default)]
struct FakeProvider {
    modes: HashMap<u32, ModeInfo>,
    /// Fail every query of this mode after it has been answered this many times.
    fail_after: HashMap<u32, usize>,
    queries: HashMap<u32, usize>,
}

impl FakeProvider {
    fn with(modes: &[(u32, ModeInfo)]) -> Self {
        Self {
            modes: modes.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl ModeInfoProvider for FakeProvider {
    type Error = QueryFailed;

    fn mode_info(&mut self, mode: VideoMode) -> Result<ModeInfo, Self::Error> {
        let count = self.queries.entry(mode.id()).or_default();
        *count += 1;
        if let Some(&limit) = self.fail_after.get(&mode.id())
            && *count > limit
        {
            return Err(QueryFailed);
        }
        self.modes.get(&mode.id()).copied().ok_or(QueryFailed)
    }
}

const CFG: SelectorConfig = SelectorConfig::DEFAULT;

fn m(id: u32) -> VideoMode {
    VideoMode::new(id)
}

fn run<const N: usize>(
    provider: &mut FakeProvider,
    count: u32,
    text: Option<VideoMode>,
) -> RankedModes<N> {
    let mut table = RankedModes::<N>::new();
    select_video_mode(
        provider,
        Candidates::Range(count),
        &CFG,
        text,
        &mut table,
        None,
    )
    .expect("selection");
    table
}

#[test]
fn below_minimum_is_dropped_and_smallest_usable_becomes_default() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1024, 768, 32)),
        (1, ModeInfo::new(800, 600, 32)),
        (2, ModeInfo::new(640, 480, 32)),
    ]);
    let table = run::<8>(&mut p, 3, None);

    assert_eq!(table.as_slice(), &[m(0), m(1)]);
    assert_eq!(table.default_mode(), m(1));
}

#[test]
fn preferred_resolution_wins() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(800, 600, 32)),
        (1, ModeInfo::new(1920, 1080, 32)),
        (2, ModeInfo::new(2560, 1440, 32)),
    ]);
    let table = run::<8>(&mut p, 3, None);
    assert_eq!(table.default_mode(), m(1));
}

#[test]
fn preferred_resolution_past_the_soft_capacity_is_not_default() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(800, 600, 32)),
        (1, ModeInfo::new(1024, 768, 32)),
        (2, ModeInfo::new(1280, 1024, 32)),
        (3, ModeInfo::new(1920, 1080, 32)),
        (4, ModeInfo::new(2560, 1440, 32)),
    ]);
    let table = run::<4>(&mut p, 5, None);

    assert_eq!(table.as_slice(), &[m(0), m(1), m(2), m(4)]);
    assert!(!table.contains(m(3)));
    assert_eq!(table.default_mode(), m(0));
}

#[test]
fn smallest_listed_mode_is_default_when_the_global_minimum_is_not_optimal() {
    // 801 x 600 is usable and smallest but not optimal.
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(801, 600, 32)),
        (1, ModeInfo::new(1280, 1024, 32)),
        (2, ModeInfo::new(1024, 768, 32)),
    ]);
    let table = run::<8>(&mut p, 3, None);

    assert_eq!(table.as_slice(), &[m(1), m(2)]);
    assert_eq!(table.default_mode(), m(2));
}

#[test]
fn depth_mismatch_and_unsupported_are_skipped() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1024, 768, 24)),
        (1, ModeInfo::new(1280, 1024, 32).unsupported()),
        (2, ModeInfo::new(1024, 768, 32)),
    ]);
    let table = run::<8>(&mut p, 3, None);
    assert_eq!(table.as_slice(), &[m(2)]);
    assert_eq!(table.default_mode(), m(2));
}

#[test]
fn failing_candidate_queries_are_skipped() {
    let mut p = FakeProvider::with(&[(1, ModeInfo::new(1024, 768, 32))]);
    // Mode 0 and 2 do not exist and fail their query.
    let table = run::<8>(&mut p, 3, None);
    assert_eq!(table.as_slice(), &[m(1)]);
}

#[test]
fn text_mode_is_entry_zero_and_never_default_when_alternatives_exist() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1024, 768, 32)),
        (1, ModeInfo::new(800, 600, 32)),
    ]);
    let text = m(0x100);
    let table = run::<8>(&mut p, 2, Some(text));

    assert_eq!(table.get(0), Some(text));
    assert_eq!(table.len(), 3);
    assert_eq!(table.default_mode(), m(1));
}

#[test]
fn text_mode_alone_is_counted() {
    let mut p = FakeProvider::default();
    let text = m(0x100);
    let table = run::<4>(&mut p, 4, Some(text));

    assert_eq!(table.as_slice(), &[text]);
    assert_eq!(table.default_mode(), text);
}

#[test]
fn non_optimal_maximum_is_appended_as_fallback() {
    // 1366 is not divisible by 8, so the mode is usable but not optimal.
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1024, 768, 32)),
        (1, ModeInfo::new(1366, 768, 32)),
    ]);
    let table = run::<8>(&mut p, 2, None);

    assert_eq!(table.as_slice(), &[m(0), m(1)]);
    assert_eq!(table.default_mode(), m(0));
}

#[test]
fn only_non_optimal_modes_default_to_the_max_fallback() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1366, 768, 32)),
        (1, ModeInfo::new(1002, 700, 32)),
    ]);
    let table = run::<8>(&mut p, 2, None);

    // The smaller mode is never listed, so it cannot be the default.
    assert_eq!(table.as_slice(), &[m(0)]);
    assert_eq!(table.default_mode(), m(0));
}

#[test]
fn max_mode_fallback_survives_exhausted_soft_capacity() {
    // 10 optimal modes of increasing size and one non-optimal giant at the end.
    let mut modes: Vec<(u32, ModeInfo)> = (0..10)
        .map(|i| (i, ModeInfo::new(800 + 8 * i, 600, 32)))
        .collect();
    modes.push((10, ModeInfo::new(4001, 3000, 32)));
    let mut p = FakeProvider::with(&modes);

    let table = run::<4>(&mut p, 11, None);

    assert_eq!(table.len(), 4);
    assert_eq!(table.as_slice(), &[m(0), m(1), m(2), m(10)]);
}

#[test]
fn max_mode_fallback_survives_with_text_mode_filling_slots() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(800, 600, 32)),
        (1, ModeInfo::new(1024, 768, 32)),
        (2, ModeInfo::new(1280, 1024, 32)),
    ]);
    let text = m(0x100);
    let table = run::<2>(&mut p, 3, Some(text));

    assert_eq!(table.as_slice(), &[text, m(2)]);
    assert_eq!(table.default_mode(), m(2));
}

#[test]
fn failing_max_mode_requery_is_fatal() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1024, 768, 32)),
        (1, ModeInfo::new(1366, 768, 32)),
    ]);
    p.fail_after.insert(1, 1);

    let mut table = RankedModes::<8>::new();
    let err = select_video_mode(&mut p, Candidates::Range(2), &CFG, None, &mut table, None)
        .expect_err("re-query must fail");
    assert!(matches!(
        err,
        SelectError::MaxModeQuery { mode, cause: QueryFailed } if mode == m(1)
    ));
}

#[test]
fn explicit_candidate_list_is_used() {
    let mut p = FakeProvider::with(&[
        (0x112, ModeInfo::new(640, 480, 32)),
        (0x118, ModeInfo::new(1024, 768, 32)),
        (0x144, ModeInfo::new(1920, 1080, 32)),
    ]);
    let list = [m(0x144), m(0x112), m(0x118)];
    let mut table = RankedModes::<8>::new();
    select_video_mode(
        &mut p,
        Candidates::List(&list),
        &CFG,
        None,
        &mut table,
        None,
    )
    .expect("selection");

    assert_eq!(table.as_slice(), &[m(0x144), m(0x118)]);
    assert_eq!(table.default_mode(), m(0x144));
}

#[test]
fn no_usable_modes_leave_default_invalid() {
    let mut p = FakeProvider::with(&[(0, ModeInfo::new(320, 200, 32))]);
    let table = run::<4>(&mut p, 1, None);
    assert!(table.is_empty());
    assert_eq!(table.default_mode(), VideoMode::INVALID);
}

#[test]
fn listing_prints_accepted_modes() {
    let mut p = FakeProvider::with(&[
        (0, ModeInfo::new(1920, 1080, 32)),
        (1, ModeInfo::new(640, 480, 32)),
        (2, ModeInfo::new(1366, 768, 32)),
        (3, ModeInfo::new(2562, 1440, 32)),
    ]);
    let mut out = String::new();
    let mut table = RankedModes::<8>::new();
    select_video_mode(
        &mut p,
        Candidates::Range(4),
        &CFG,
        Some(m(0x100)),
        &mut table,
        Some(&mut out),
    )
    .expect("selection");

    assert_eq!(
        out,
        "Mode [0]: text mode 80 x 25\n\
         Mode [1]: 1920 x 1080 x 32 [DEFAULT]\n\
         Mode [2]: 2562 x 1440 x 32\n"
    );
}

#[test]
fn every_listed_mode_is_usable_and_default_is_listed() {
    // A small deterministic sweep over mixed geometries.
    let widths = [640, 800, 801, 1024, 1280, 1366, 1920, 2560];
    let heights = [480, 600, 720, 768, 1080, 1440];
    let mut modes = Vec::new();
    let mut id = 0;
    for &w in &widths {
        for &h in &heights {
            modes.push((id, ModeInfo::new(w, h, 32)));
            id += 1;
        }
    }

    for skip in 0..modes.len() {
        let subset: Vec<_> = modes.iter().copied().skip(skip).collect();
        let count = u32::try_from(modes.len()).unwrap();
        let mut p = FakeProvider::with(&subset);
        let table = run::<6>(&mut p, count, None);

        for mode in table.as_slice() {
            let info = subset.iter().find(|(i, _)| *i == mode.id()).unwrap().1;
            assert!(info.is_usable(&CFG), "{info:?} listed but not usable");
        }
        let default = table.default_mode();
        assert!(!default.is_valid() || table.contains(default), "{default}");
    }
}
