use clap::Parser;
use feature_significance::param::{self, Param};
use feature_significance::testing::StatisticKind;
use std::process;

/// Permutation significance testing of features between Positive and Unlabelled observations.
#[derive(Parser, Debug)]
#[command(name = "feature-significance", version, about)]
struct Cli {
    /// Tab-separated dataset; the last header column holds the class labels
    dataset: Option<String>,

    /// Results directory to create; must not already exist
    output: Option<String>,

    /// YAML parameter file; other options given on the command line override it
    #[arg(long)]
    param: Option<String>,

    /// Comma-separated feature names to leave out of the test
    #[arg(short = 'f', long = "features")]
    features: Option<String>,

    /// Number of label permutations to evaluate
    #[arg(short = 'N', long)]
    permutations: Option<usize>,

    /// Test statistic: mean, median or ranksum
    #[arg(short = 't', long)]
    statistic: Option<StatisticKind>,

    /// Significance level; repeat for several
    #[arg(short = 's', long = "alpha")]
    alpha: Vec<f64>,

    /// Family-wise alpha of the Holm-Bonferroni correction
    #[arg(short = 'c', long)]
    correct: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads, 0 for one per core
    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    positive_label: Option<String>,

    #[arg(long)]
    class_column: Option<String>,

    /// Header lines after the feature names that carry no observations
    #[arg(long)]
    skip_header_lines: Option<usize>,

    /// The first skipped header line holds feature types; x and r columns are dropped
    #[arg(long)]
    feature_type_row: bool,

    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_param(self) -> anyhow::Result<Param> {
        let mut param = match &self.param {
            Some(path) => param::get_unchecked(path)?,
            None => Param::default(),
        };

        if let Some(dataset) = self.dataset {
            param.data.dataset = dataset;
        }
        if let Some(output) = self.output {
            param.data.output = output;
        }
        if let Some(features) = self.features {
            param.data.exclude_features = features
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(permutations) = self.permutations {
            param.permutation.permutations = permutations;
        }
        if let Some(statistic) = self.statistic {
            param.permutation.statistic = statistic;
        }
        if !self.alpha.is_empty() {
            param.permutation.alphas = self.alpha;
        }
        if let Some(correct) = self.correct {
            param.permutation.correction_alpha = correct;
        }
        if self.seed.is_some() {
            param.general.seed = self.seed;
        }
        if let Some(threads) = self.threads {
            param.general.thread_number = threads;
        }
        if let Some(label) = self.positive_label {
            param.data.positive_label = label;
        }
        if let Some(column) = self.class_column {
            param.data.class_column = column;
        }
        if let Some(skip) = self.skip_header_lines {
            param.data.skip_header_lines = skip;
        }
        if self.feature_type_row {
            param.data.feature_type_row = true;
        }
        if let Some(level) = self.log_level {
            param.general.log_level = level;
        }

        Ok(param)
    }
}

fn main() {
    let cli = Cli::parse();

    let param = match cli.into_param() {
        Ok(param) => param,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    };

    let _logger = match flexi_logger::Logger::try_with_env_or_str(&param.general.log_level)
        .and_then(|logger| logger.start())
    {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Cannot start logger: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = feature_significance::run(&param) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
