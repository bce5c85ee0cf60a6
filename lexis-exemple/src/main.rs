use std::collections::BTreeSet;
use std::env;

use lexis_core::config::LexisConfig;
use lexis_core::language::{dominant_language, identify_languages, LanguageGraph};
use lexis_core::stemming::{stem_tokens, SuffixClusterStemmer};
use lexis_core::topics::{run_models, Corpus, TopicModelConfig};
use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Usage: lexis-exemple [config.json] [corpus folder]
    // The config file is optional; every missing value takes its default
    let args: Vec<String> = env::args().collect();
    let mut config = match args.get(1) {
        Some(path) => LexisConfig::from_json_file(path)?,
        None => {
            // The default prefix length (5) suits large vocabularies; a handful
            // of messages needs a shorter one
            let mut config = LexisConfig::default();
            config.stemmer.l = 3;
            config.stemmer.alpha = 1;
            config
        }
    };

    // Language graph: either one "<language>.txt" file per language in a folder
    // (trained in parallel, cached as .bin next to each file), or a tiny inline corpus
    let graph = match args.get(2) {
        Some(folder) => LanguageGraph::from_folder(folder, config.language.clone())?,
        None => {
            let mut graph = LanguageGraph::new(config.language.clone())?;
            graph.add_document("the weather is nice today and the sun is shining", "en");
            graph.add_document("i am running to the station, the train leaves soon", "en");
            graph.add_document("il fait beau aujourd'hui et le soleil brille", "fr");
            graph.add_document("je cours vers la gare, le train part bientôt", "fr");
            graph
        }
    };

    let messages = [
        "the runner was running to the station",
        "he runs every day, running is his passion",
        "le soleil brille sur la gare",
        "",
        "the baker bakes bread, baking bread every morning",
        "bread and baking, the bakery smells nice",
    ];

    // Identify the language of every message
    for (message, scores) in messages.iter().zip(identify_languages(&graph, &messages)) {
        match dominant_language(&scores) {
            Some((language, score)) => println!("[{} {:.3}] {}", language, score, message),
            None => println!("[unknown] {}", message),
        }
    }

    // Stem the vocabulary of the messages
    let tokens: Vec<Vec<String>> = messages
        .iter()
        .map(|message| {
            message
                .split(|c: char| !c.is_alphanumeric() && c != '\'')
                .filter(|token| !token.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .collect();
    let vocabulary: BTreeSet<&str> = tokens.iter().flatten().map(String::as_str).collect();

    let stemmer = SuffixClusterStemmer::new(config.stemmer.clone())?;
    let stems = stemmer.stem(vocabulary);
    for (word, stem) in stems.iter().filter(|(word, stem)| word != stem) {
        println!("{} -> {}", word, stem);
    }

    // Topic models over the stemmed messages
    let stemmed: Vec<Vec<String>> = tokens.iter().map(|document| stem_tokens(&stems, document)).collect();
    let corpus = Corpus::new(&stemmed)?;

    if config.topics.is_empty() {
        let mut dmm = TopicModelConfig::dmm(2, 5)?;
        dmm.seed = Some(42);
        let mut lda = TopicModelConfig::lda(2, 5)?;
        lda.seed = Some(42);
        config.topics = vec![dmm, lda];
    }

    for result in run_models(&corpus, &config.topics)? {
        info!("{:?}: {} documents", result.parameters.kind, result.parameters.documents);
        println!("{:?} topics", result.parameters.kind);
        for topic in &result.top_words {
            let words: Vec<String> = topic
                .words
                .iter()
                .map(|w| format!("{} ({})", w.word, w.probability))
                .collect();
            println!("  topic {}: {}", topic.topic, words.join(", "));
        }
        for (document, &source) in result.source_indices.iter().enumerate() {
            if let Some(topic) = result.dominant_topic(document) {
                println!("  message {} -> topic {}", source, topic);
            }
        }
    }

    Ok(())
}
