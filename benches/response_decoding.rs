//! Benchmarks for response decoding
//!
//! This benchmark measures:
//! - Full diagnostic report decoding
//! - Unlock decoding (fence stripping)
//! - Fallback decoding of unstructured text
//! - Mode classification

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use roma_protocol::classifier::classify;
use roma_protocol::{decode, ConversationMode};

const DIAGNOSTIC_REPLY: &str = "RISK_LEVEL: HIGH
CONFIDENCE: 0.88
ROOT_CAUSE:
Axis 4 encoder signal lost after cable abrasion in the dress pack.
FIX_STEPS:
1. Engage E-STOP and apply lockout/tagout.
2. Replace the A4 encoder cable.
3. Re-master axis 4 with the EMD.
SAFETY_CHECKLIST:
- [ ] Power isolated and verified
- [ ] Brakes engaged on all axes
- [ ] Cell door interlocked
RECOVERY_CODE:
BLOCKED BY SAFETY GATE
PREVENTION_STRATEGY:
Add a protective sleeve and re-route the dress pack.
POST_VALIDATION:
Jog A4 through its full range at T1.
UI_METADATA:
CODE_ALLOWED: FALSE
AUDIT_LOG:
KSS 12043 at 08:15:02, operator acknowledged.
Standing by for next input.";

const UNLOCK_REPLY: &str = "RECOVERY_CODE:
```python
import rclpy
from rclpy.node import Node
from std_srvs.srv import Trigger

rclpy.init()
node = Node('recovery')
client = node.create_client(Trigger, '/arm/reset')
```
Standing by for next input.";

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    group.throughput(Throughput::Bytes(DIAGNOSTIC_REPLY.len() as u64));
    group.bench_function("diagnostic_report", |b| {
        b.iter(|| decode(black_box(DIAGNOSTIC_REPLY), ConversationMode::Diagnostic))
    });

    group.throughput(Throughput::Bytes(UNLOCK_REPLY.len() as u64));
    group.bench_function("unlock_grant", |b| {
        b.iter(|| decode(black_box(UNLOCK_REPLY), ConversationMode::Unlock))
    });

    group.finish();
}

fn bench_decode_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_scaling");
    for repeats in [1usize, 4, 16] {
        let padded = DIAGNOSTIC_REPLY.replace(
            "ROOT_CAUSE:\n",
            &format!("ROOT_CAUSE:\n{}", "Observed torque spike on A4.\n".repeat(repeats * 8)),
        );
        group.throughput(Throughput::Bytes(padded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &padded, |b, raw| {
            b.iter(|| decode(black_box(raw), ConversationMode::Diagnostic))
        });
    }
    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.bench_function("log_text", |b| {
        b.iter(|| classify(black_box("[ERROR] 08:15:02 KSS 12043 encoder fault A4"), true))
    });
    group.bench_function("unlock_phrase", |b| {
        b.iter(|| classify(black_box("I confirm all safety checks. Unlock code."), false))
    });
    group.finish();
}

criterion_group!(benches, bench_decode, bench_decode_scaling, bench_classify);
criterion_main!(benches);
