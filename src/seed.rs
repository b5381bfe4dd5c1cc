use crate::db::Database;

struct SeedWord {
    text: &'static str,
    definition: &'static str,
    phonetic: &'static str,
    level: &'static str,
}

const SEED_WORDS: &[SeedWord] = &[
    // Finance / quant theme
    SeedWord { text: "arbitrage", definition: "利用不同市场的价格差异获利", phonetic: "/ˈɑːrbɪtrɑːʒ/", level: "GRE" },
    SeedWord { text: "volatile", definition: "易变的；不稳定的", phonetic: "/ˈvɒlətaɪl/", level: "GRE" },
    SeedWord { text: "leverage", definition: "杠杆；影响力", phonetic: "/ˈliːvərɪdʒ/", level: "GRE" },
    SeedWord { text: "derivative", definition: "衍生品；派生的", phonetic: "/dɪˈrɪvətɪv/", level: "GRE" },
    SeedWord { text: "portfolio", definition: "投资组合；作品集", phonetic: "/pɔːrtˈfəʊliəʊ/", level: "考研" },
    // Academic / research theme
    SeedWord { text: "latent", definition: "潜在的；隐藏的", phonetic: "/ˈleɪtənt/", level: "GRE" },
    SeedWord { text: "empirical", definition: "经验主义的；实证的", phonetic: "/ɪmˈpɪrɪkəl/", level: "GRE" },
    SeedWord { text: "paradigm", definition: "范式；典范", phonetic: "/ˈpærədaɪm/", level: "GRE" },
    SeedWord { text: "hypothesis", definition: "假设；假说", phonetic: "/haɪˈpɒθəsɪs/", level: "考研" },
    SeedWord { text: "synthesis", definition: "综合；合成", phonetic: "/ˈsɪnθəsɪs/", level: "GRE" },
    // General advanced
    SeedWord { text: "ubiquitous", definition: "无处不在的", phonetic: "/juːˈbɪkwɪtəs/", level: "GRE" },
    SeedWord { text: "ephemeral", definition: "短暂的；转瞬即逝的", phonetic: "/ɪˈfemərəl/", level: "GRE" },
    SeedWord { text: "pragmatic", definition: "务实的；实用主义的", phonetic: "/præɡˈmætɪk/", level: "考研" },
    SeedWord { text: "ambiguous", definition: "模糊的；有歧义的", phonetic: "/æmˈbɪɡjuəs/", level: "考研" },
    SeedWord { text: "coherent", definition: "连贯的；一致的", phonetic: "/kəʊˈhɪərənt/", level: "考研" },
    // Tech / AI theme
    SeedWord { text: "algorithm", definition: "算法", phonetic: "/ˈælɡərɪðəm/", level: "考研" },
    SeedWord { text: "iteration", definition: "迭代；重复", phonetic: "/ˌɪtəˈreɪʃən/", level: "GRE" },
    SeedWord { text: "optimize", definition: "优化", phonetic: "/ˈɒptɪmaɪz/", level: "考研" },
    SeedWord { text: "aggregate", definition: "聚合；总计", phonetic: "/ˈæɡrɪɡət/", level: "GRE" },
    SeedWord { text: "robust", definition: "稳健的；强壮的", phonetic: "/rəʊˈbʌst/", level: "考研" },
];

/// Seeds the demo word list into an empty catalog so a fresh deployment has
/// something to practice on. No-op when importers already filled the table.
pub async fn seed_words(db: &Database) {
    let count: i64 = match sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
        .fetch_one(db.pool())
        .await
    {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(error = %err, "seed check failed");
            return;
        }
    };

    if count > 0 {
        tracing::debug!(count, "word catalog already populated, skipping seed");
        return;
    }

    let mut seeded = 0usize;
    for word in SEED_WORDS {
        let result = sqlx::query(
            r#"
            INSERT INTO "words" ("text", "definition", "phonetic", "level")
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ("text") DO NOTHING
            "#,
        )
        .bind(word.text)
        .bind(word.definition)
        .bind(word.phonetic)
        .bind(word.level)
        .execute(db.pool())
        .await;

        match result {
            Ok(_) => seeded += 1,
            Err(err) => tracing::warn!(error = %err, word = word.text, "failed to seed word"),
        }
    }

    tracing::info!(seeded, "seeded demo word catalog");
}
