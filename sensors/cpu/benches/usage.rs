use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sensu_go_cpu_check::{CpuStats, UsageSnapshot};

const PROC_STAT: &str = "cpu  10132153 290696 3084719 46828483 16683 0 25195 0 0 0";

fn bench_usage(c: &mut Criterion) {
    let earlier = CpuStats::parse_proc_stat(PROC_STAT).expect("valid sample");
    let later = CpuStats {
        user: earlier.user + 731,
        system: earlier.system + 212,
        idle: earlier.idle + 2377,
        iowait: earlier.iowait + 58,
        ..earlier
    };

    c.bench_function("parse_proc_stat", |b| {
        b.iter(|| CpuStats::parse_proc_stat(black_box(PROC_STAT)))
    });

    c.bench_function("usage_between", |b| {
        b.iter(|| UsageSnapshot::between(black_box(&earlier), black_box(&later), 8))
    });

    c.bench_function("format_line", |b| {
        let usage = UsageSnapshot::between(&earlier, &later, 8).expect("counters advanced");
        b.iter(|| black_box(&usage).format_line())
    });
}

criterion_group!(benches, bench_usage);
criterion_main!(benches);
