use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scriptbox::{ClassAccessPolicy, PrefixMatcher};

fn host_policy() -> ClassAccessPolicy {
    ClassAccessPolicy::new(
        [
            "java.lang.String",
            "java.lang.Integer",
            "java.lang.Math",
            "java.lang.StringBuilder",
            "java.util.ArrayList",
            "java.util.HashMap",
            "java.util.LinkedHashMap",
            "java.util.regex",
            "java.text.SimpleDateFormat",
            "java.net.URLEncoder",
            "org.jsoup",
            "io.legado.app",
        ],
        [
            "java.lang.Runtime",
            "java.lang.ProcessBuilder",
            "java.lang.reflect",
            "java.lang.invoke",
            "java.io.File",
            "io.legado.app.data.dao",
        ],
    )
}

fn bench_prefix_matcher(c: &mut Criterion) {
    let matcher = PrefixMatcher::new([
        "java.lang.String",
        "java.util.ArrayList",
        "java.util.regex",
        "org.jsoup",
        "io.legado.app",
    ]);

    c.bench_function("match_hit_deep_name", |b| {
        b.iter(|| black_box(matcher.matches(black_box("io.legado.app.data.entities.Book"))));
    });

    c.bench_function("match_miss_shared_stem", |b| {
        b.iter(|| black_box(matcher.matches(black_box("java.lang.StringBuilder"))));
    });

    c.bench_function("match_miss_unknown", |b| {
        b.iter(|| black_box(matcher.matches(black_box("com.example.unknown.Widget"))));
    });
}

fn bench_class_policy(c: &mut Criterion) {
    let policy = host_policy();

    c.bench_function("is_visible_whitelisted", |b| {
        b.iter(|| black_box(policy.is_visible(black_box("org.jsoup.nodes.Document"))));
    });

    c.bench_function("is_visible_blacklisted", |b| {
        b.iter(|| black_box(policy.is_visible(black_box("java.lang.reflect.Method"))));
    });

    c.bench_function("is_visible_default_deny", |b| {
        b.iter(|| black_box(policy.is_visible(black_box("net.custom.library.Loader"))));
    });
}

criterion_group!(benches, bench_prefix_matcher, bench_class_policy);
criterion_main!(benches);
