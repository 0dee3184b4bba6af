use approx::assert_relative_eq;
use dada2_trim_params::threshold::{avg_ee_trim_table, ee_sums, recommend};
use dada2_trim_params::{
    EeProfile, QcError, TrimCandidate, TrimConfig, TrimWarnings, TrimWindow, get_trim_length_avg_ee,
    read_size_by_avg_ee, read_size_by_max_ee, trim_ends_less_than_threshold,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn obvious_trimming_cuts_low_quality_ends() {
    init_logs();
    let avg = [
        15.0, 20.0, 22.0, 30.0, 30.0, 40.0, 30.0, 30.0, 25.0, 20.0, 15.0,
    ];
    let w = trim_ends_less_than_threshold(&avg, 30, 0.1).unwrap();
    assert_eq!(w, TrimWindow { left: 3, right: 8 });
    assert_eq!(w.len(), 5);
}

#[test]
fn obvious_trimming_keeps_a_clean_read_whole() {
    init_logs();
    let avg = [30.0, 30.0, 30.0, 30.0, 30.0, 40.0, 30.0, 30.0, 30.0, 30.0, 30.0];
    let w = trim_ends_less_than_threshold(&avg, 30, 0.1).unwrap();
    assert_eq!(w, TrimWindow { left: 0, right: 11 });
}

#[test]
fn obvious_trimming_flags_deep_cuts() {
    init_logs();
    let left_short = [15.0, 18.0, 18.0, 30.0, 30.0, 40.0, 30.0, 30.0, 25.0, 20.0, 15.0];
    let w = trim_ends_less_than_threshold(&left_short, 30, 0.1).unwrap();
    assert_eq!(w, TrimWindow { left: 3, right: 8 });
    assert!(w.warnings(left_short.len(), 0.1).left_too_deep);

    let right_short = [15.0, 20.0, 22.0, 30.0, 30.0, 40.0, 30.0, 30.0, 18.0, 18.0, 15.0];
    let w = trim_ends_less_than_threshold(&right_short, 30, 0.1).unwrap();
    assert!(w.warnings(right_short.len(), 0.1).right_too_deep);

    // only the tail is poor
    let tail = [30.0, 30.0, 30.0, 30.0, 30.0, 40.0, 30.0, 30.0, 25.0, 20.0, 15.0];
    let w = trim_ends_less_than_threshold(&tail, 30, 0.1).unwrap();
    assert_eq!(
        w.warnings(tail.len(), 0.1),
        TrimWarnings {
            untrimmed: false,
            left_too_deep: false,
            right_too_deep: true,
        }
    );
    // a looser limit accepts the same cut
    assert!(!w.warnings(tail.len(), 0.3).any());
}

#[test]
fn obvious_trimming_flags_untrimmed_profile() {
    let avg = [30.0; 11];
    let w = trim_ends_less_than_threshold(&avg, 30, 0.1).unwrap();
    assert_eq!(
        w.warnings(avg.len(), 0.1),
        TrimWarnings {
            untrimmed: true,
            left_too_deep: false,
            right_too_deep: false,
        }
    );
}

#[test]
fn obvious_trimming_edge_cases() {
    assert_eq!(
        trim_ends_less_than_threshold(&[], 30, 0.1).unwrap(),
        TrimWindow { left: 0, right: 0 }
    );
    assert!(matches!(
        trim_ends_less_than_threshold(&[30.0], 43, 0.1),
        Err(QcError::InvalidArgument(_))
    ));
    assert!(matches!(
        trim_ends_less_than_threshold(&[20.0, 50.0, 2.0], 30, 0.1),
        Err(QcError::InvalidArgument(_))
    ));
    assert!(matches!(
        trim_ends_less_than_threshold(&[20.0, 25.0], 30, 0.1),
        Err(QcError::SearchExceeded(_))
    ));
}

#[test]
fn candidate_window_mean() {
    let c = TrimCandidate::evaluate(&[2.0, 3.0], 0, 2).unwrap();
    assert_eq!(c.length, 2);
    assert_relative_eq!(c.mean_ee, 2.5);
    assert!(TrimCandidate::evaluate(&[2.0, 3.0], 1, 3).is_err());
}

#[test]
fn trim_table_spans_both_margins() {
    let avg_ee = [0.001; 10];
    let table = avg_ee_trim_table(&avg_ee, TrimWindow { left: 0, right: 10 }, 0.2).unwrap();
    // lefts 0..=2, rights 8..=10
    assert_eq!(table.len(), 9);
    assert!(table.iter().all(|c| c.length >= 6 && c.length <= 10));
}

fn tail_heavy() -> Vec<f64> {
    let mut avg_ee = vec![0.001; 8];
    avg_ee.extend([0.5, 0.5]);
    avg_ee
}

#[test]
fn avg_ee_search_picks_longest_clean_window() {
    let w = TrimWindow { left: 0, right: 10 };
    let best = read_size_by_avg_ee(&tail_heavy(), w, 0.01, 0.2).unwrap();
    assert_eq!((best.left, best.right, best.length), (0, 8, 8));
    assert_relative_eq!(best.mean_ee, 0.001, max_relative = 1e-12);

    assert!(matches!(
        read_size_by_avg_ee(&tail_heavy(), w, 0.0001, 0.2),
        Err(QcError::SearchExceeded(_))
    ));
    assert_eq!(
        read_size_by_avg_ee(&[], TrimWindow { left: 0, right: 0 }, 0.01, 0.2)
            .unwrap()
            .length,
        0
    );
}

#[test]
fn trim_length_by_average_ee() {
    let mut avg_ee = vec![0.001; 4];
    avg_ee.extend([0.5; 6]);
    assert_eq!(get_trim_length_avg_ee(&avg_ee, 0.01, 0.2).unwrap(), 5);
    assert_eq!(get_trim_length_avg_ee(&avg_ee, 0.01, 1.0).unwrap(), 10);
    assert_eq!(get_trim_length_avg_ee(&[], 0.01, 0.2).unwrap(), 0);
    assert!(matches!(
        get_trim_length_avg_ee(&[0.5], 0.01, 0.0),
        Err(QcError::SearchExceeded(_))
    ));
}

#[test]
fn max_ee_two_read_scenario() {
    let profiles = [
        EeProfile::from_errors(&[0.02; 5]),
        EeProfile::from_errors(&[1.0; 5]),
    ];
    assert_relative_eq!(profiles[0].total(), 0.1, max_relative = 1e-12);
    assert_relative_eq!(profiles[1].total(), 5.0);

    let half = read_size_by_max_ee(&profiles, 2.0, 0.5).unwrap();
    assert_eq!(half.length, 5);
    assert_eq!(half.flagged, vec![1]);
    assert_relative_eq!(half.failing_fraction, 0.5);

    // nobody may fail: walk left until the noisy read is within maxEE
    let strict = read_size_by_max_ee(&profiles, 2.0, 0.0).unwrap();
    assert_eq!(strict.length, 2);
    assert!(strict.flagged.is_empty());
}

#[test]
fn max_ee_counts_short_reads_as_failing() {
    let profiles = [
        EeProfile::from_errors(&[0.01; 6]),
        EeProfile::from_errors(&[0.01; 3]),
    ];
    let trim = read_size_by_max_ee(&profiles, 2.0, 0.0).unwrap();
    assert_eq!(trim.length, 3);
    let loose = read_size_by_max_ee(&profiles, 2.0, 0.5).unwrap();
    assert_eq!(loose.length, 6);
    assert_eq!(loose.flagged, vec![1]);
}

#[test]
fn max_ee_is_monotonic_in_trim_percent() {
    let scores: Vec<Vec<u8>> = (0..20u8)
        .map(|i| {
            (0..50u8)
                .map(|pos| 40u8.saturating_sub(pos / (1 + i % 5)))
                .collect()
        })
        .collect();
    let profiles: Vec<EeProfile> = scores.iter().map(|s| EeProfile::from_scores(s)).collect();

    let mut last = 0;
    for step in 0..=10 {
        let pct = f64::from(step) / 10.0;
        let length = read_size_by_max_ee(&profiles, 1.0, pct).unwrap().length;
        assert!(length >= last, "length {length} < {last} at {pct}");
        last = length;
    }
}

#[test]
fn max_ee_edge_cases() {
    let empty = read_size_by_max_ee(&[], 2.0, 0.2).unwrap();
    assert_eq!(empty.length, 0);
    assert!(empty.flagged.is_empty());

    let one = [EeProfile::from_errors(&[3.0])];
    assert!(matches!(
        read_size_by_max_ee(&one, 2.0, 0.0),
        Err(QcError::SearchExceeded(_))
    ));
    assert!(matches!(
        read_size_by_max_ee(&one, 2.0, 1.5),
        Err(QcError::InvalidArgument(_))
    ));
    assert!(matches!(
        read_size_by_max_ee(&one, -1.0, 0.2),
        Err(QcError::InvalidArgument(_))
    ));
}

#[test]
fn ee_before_and_after_obvious_trim() {
    let profiles = [EeProfile::from_errors(&[0.1, 0.2, 0.3, 0.4])];
    let rows = ee_sums(&profiles, TrimWindow { left: 1, right: 3 });
    assert_relative_eq!(rows[0].no_trimming, 1.0, max_relative = 1e-12);
    assert_relative_eq!(rows[0].obvious_trimming, 0.5, max_relative = 1e-12);
}

#[test]
fn recommendation_from_defaults() {
    init_logs();
    let mut avg_quality = vec![35.0; 10];
    avg_quality[0] = 20.0;
    avg_quality[9] = 20.0;
    let avg_ee = [0.001; 10];
    let profiles = [
        EeProfile::from_scores(&[40; 10]),
        EeProfile::from_scores(&[40; 10]),
    ];

    let rec = recommend(&avg_quality, &avg_ee, &profiles, &TrimConfig::default()).unwrap();
    assert_eq!(rec.window, TrimWindow { left: 1, right: 9 });
    assert_eq!((rec.avg_ee.left, rec.avg_ee.right), (1, 9));
    assert_eq!(rec.max_ee.length, 10);
}

#[test]
fn config_validation() {
    let cfg = TrimConfig {
        quality_threshold: 50,
        ..TrimConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = TrimConfig {
        max_trim_percent: 1.2,
        ..TrimConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert!(TrimConfig::default().validate().is_ok());
}
