use dada2_trim_params::{FastqReader, QcError, ReaderOptions, SampleKey, reservoir_step};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn fastq(n: usize) -> Vec<u8> {
    let mut data = String::new();
    for i in 0..n {
        data.push_str(&format!("@r{i}\nACGTACGT\n+\nIIII????\n"));
    }
    data.into_bytes()
}

#[test]
fn same_seed_same_sample() {
    let mut a = FastqReader::from_bytes(fastq(50), ReaderOptions::default());
    let mut b = FastqReader::from_bytes(fastq(50), ReaderOptions::default());

    let ia = a.reservoir_sampling(10, 42).unwrap().indices();
    let ib = b.reservoir_sampling(10, 42).unwrap().indices();
    assert_eq!(ia, ib);
    assert_eq!(ia.len(), 10);

    let mut sorted = ia.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 10);
    assert!(sorted.iter().all(|&i| i < 50));
}

#[test]
fn repeated_sampling_hits_the_cache() {
    let mut fq = FastqReader::from_bytes(fastq(20), ReaderOptions::default());
    let first = fq.reservoir_sampling(5, 7).unwrap().indices();
    let passes = fq.scan_count();
    let again = fq.reservoir_sampling(5, 7).unwrap().indices();
    assert_eq!(first, again);
    assert_eq!(fq.scan_count(), passes);
}

#[test]
fn sample_records_match_their_indices() {
    let mut fq = FastqReader::from_bytes(fastq(30), ReaderOptions::default());
    let sample = fq.reservoir_sampling(6, 3).unwrap();
    for (index, rec) in sample.slots() {
        assert_eq!(rec.id(), format!("r{index}"));
    }
}

#[test]
fn different_seeds_are_cached_separately() {
    let mut fq = FastqReader::from_bytes(fastq(40), ReaderOptions::default());
    let one = fq.reservoir_sampling(4, 1).unwrap().indices();
    let two = fq.reservoir_sampling(4, 2).unwrap().indices();
    assert_eq!(fq.reservoir_sampling(4, 1).unwrap().indices(), one);
    assert_eq!(fq.reservoir_sampling(4, 2).unwrap().indices(), two);

    let key = SampleKey {
        seed: 1,
        n_samples: 4,
    };
    assert!(fq.state().sample(&key).is_some());
}

#[test]
fn sampling_leaves_the_count_cache_alone() {
    let mut fq = FastqReader::from_bytes(fastq(12), ReaderOptions::default());
    assert_eq!(fq.total_reads().unwrap(), 12);
    assert_eq!(fq.scan_count(), 1);

    fq.reservoir_sampling(3, 11).unwrap();
    fq.reservoir_sampling(3, 12).unwrap();
    assert_eq!(fq.scan_count(), 3);

    assert_eq!(fq.total_reads().unwrap(), 12);
    assert_eq!(fq.scan_count(), 3);
}

#[test]
fn whole_population_sample_keeps_stream_order() {
    let mut fq = FastqReader::from_bytes(fastq(5), ReaderOptions::default());
    let sample = fq.reservoir_sampling(5, 99).unwrap();
    assert_eq!(sample.indices(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn oversized_sample_is_rejected() {
    let mut fq = FastqReader::from_bytes(fastq(5), ReaderOptions::default());
    match fq.reservoir_sampling(6, 1) {
        Err(QcError::SampleTooLarge {
            requested: 6,
            total: 5,
        }) => {}
        other => panic!("expected sample too large, got {other:?}"),
    }
}

#[test]
fn empty_sample() {
    let mut fq = FastqReader::from_bytes(fastq(5), ReaderOptions::default());
    assert!(fq.reservoir_sampling(0, 1).unwrap().is_empty());
}

#[test]
fn sample_rows_and_summary_reuse_the_reservoir() {
    let mut fq = FastqReader::from_bytes(fastq(25), ReaderOptions::default());
    let rows = fq.sample_df(8, 5).unwrap();
    let passes = fq.scan_count();
    assert_eq!(rows.len(), 8);

    let mut expected: Vec<String> = fq
        .reservoir_sampling(8, 5)
        .unwrap()
        .indices()
        .into_iter()
        .map(|i| format!("r{i}"))
        .collect();
    expected.sort_by_key(|id| id[1..].parse::<usize>().unwrap());
    let got: Vec<String> = rows.into_iter().map(|r| r.id).collect();
    assert_eq!(got, expected);

    let summary = fq.sample_ee_summary(8, 5).unwrap();
    assert_eq!(summary.count, 8);
    assert_eq!(fq.scan_count(), passes);
}

#[test]
fn reservoir_step_fills_then_replaces() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut res = Vec::new();
    for i in 0..3 {
        res = reservoir_step(res, i, i, 3, &mut rng);
    }
    assert_eq!(res, vec![0, 1, 2]);

    for i in 3..100 {
        res = reservoir_step(res, i, i, 3, &mut rng);
        assert_eq!(res.len(), 3);
    }

    let untouched = reservoir_step(vec![7], 8, 1, 0, &mut rng);
    assert_eq!(untouched, vec![7]);
}

#[test]
fn reservoir_step_is_roughly_uniform() {
    let mut counts = [0usize; 4];
    for seed in 0..2000u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut res = Vec::new();
        for i in 0..4 {
            res = reservoir_step(res, i, i, 1, &mut rng);
        }
        counts[res[0]] += 1;
    }
    for c in counts {
        assert!((400..=600).contains(&c), "counts {counts:?}");
    }
}
