//! Contains the main `run()` function of the command-line driver.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use constgen_diagnostic::{Abort, Diagnostic, Report, Severity};
use constgen_evaluator::{Function, Interpreter};
use constgen_handler::Handler;
use constgen_monomorphize::{Compilation, Config};
use constgen_term::adt::AdtDefinition;
use constgen_type_system::{
    associated::{Implementation, TraitDefinition},
    declaration::{Item, OrderingMode},
    diagnostic::{Error, UnknownSymbol},
    inference::CallSite,
};
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The arguments to the program.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, clap::Parser)]
#[clap(
    name = "constgen",
    about = "Resolves and instantiates value-parameterized generic items",
    author = "Simmypeet"
)]
pub struct Arguments {
    /// The RON file containing the declarations and the use sites.
    pub file: PathBuf,

    /// The TOML file to read the configuration from. Missing keys take their
    /// default values.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The number of steps a single constant evaluation may take. Overrides
    /// the configuration file.
    #[clap(short, long)]
    pub budget: Option<usize>,

    /// Allows types and value parameters to interleave after the lifetimes.
    #[clap(long)]
    pub mixed_order: bool,
}

/// A failure to load one of the input files.
#[derive(Debug, displaydoc::Display, thiserror::Error)]
pub enum LoadError {
    /// failed to read `{path}`: {source}
    Io {
        /// The file that couldn't be read.
        path: String,

        /// The underlying error.
        source: std::io::Error,
    },

    /// `{path}` is not a valid declaration file: {source}
    Program {
        /// The offending file.
        path: String,

        /// The underlying error.
        source: ron::error::SpannedError,
    },

    /// `{path}` is not a valid configuration file: {source}
    Config {
        /// The offending file.
        path: String,

        /// The underlying error.
        source: toml::de::Error,
    },
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl Arguments {
    /// Returns the configuration: the file given by `--config` if any, with
    /// the command-line flags applied on top.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the configuration file can't be read or
    /// parsed.
    pub fn config(&self) -> Result<Config, LoadError> {
        let mut config = match &self.config {
            Some(path) => {
                toml::from_str(&read(path)?).map_err(|source| {
                    LoadError::Config { path: path.display().to_string(), source }
                })?
            }
            None => Config::default(),
        };

        if let Some(budget) = self.budget {
            config.budget = budget;
        }

        if self.mixed_order {
            config.ordering = OrderingMode::Mixed;
        }

        Ok(config)
    }
}

/// A use site of a generic item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Use {
    /// The name of the used item.
    pub item: String,

    /// What the use site provides.
    #[serde(default)]
    pub call_site: CallSite,
}

/// The content of a declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Program {
    /// The structs and enums.
    pub adts: Vec<AdtDefinition>,

    /// The traits.
    pub traits: Vec<TraitDefinition>,

    /// The pure functions constant expressions may call, by name.
    pub functions: BTreeMap<String, Function>,

    /// The generic items.
    pub items: Vec<Item>,

    /// The trait implementations.
    pub implementations: Vec<Implementation>,

    /// The use sites, instantiated in order.
    pub uses: Vec<Use>,
}

impl Program {
    /// Loads a program from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file can't be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        ron::from_str(&read(path)?).map_err(|source| LoadError::Program {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Declares everything in the program and instantiates its use sites.
///
/// Returns the rendered instantiation of every use site in order; failures
/// are reported to the handler.
pub fn execute(
    program: Program,
    config: Config,
    handler: Arc<dyn Handler<Error>>,
) -> Vec<Result<String, Abort>> {
    let Program { adts, traits, functions, items, implementations, uses } =
        program;

    let mut interpreter = Interpreter::new();
    for (name, function) in functions {
        interpreter.register(name, function);
    }

    let mut compilation =
        Compilation::new(Arc::new(interpreter), config, Arc::clone(&handler));

    // a rejected declaration has already been reported, the rest carry on
    let mut rejected = adts
        .into_iter()
        .map(|adt| compilation.declare_adt(adt))
        .filter(Result::is_err)
        .count();
    rejected += traits
        .into_iter()
        .map(|definition| compilation.declare_trait(definition))
        .filter(Result::is_err)
        .count();
    rejected += items
        .into_iter()
        .map(|item| compilation.declare_item(item))
        .filter(Result::is_err)
        .count();
    rejected += implementations
        .into_iter()
        .map(|implementation| compilation.declare_implementation(implementation))
        .filter(Result::is_err)
        .count();

    info!("{rejected} declaration(s) rejected");

    let requests = uses
        .into_iter()
        .map(|Use { item, call_site }| {
            let Some(id) = compilation.item_by_name(&item) else {
                handler.receive(UnknownSymbol::new(item, call_site.span).into());
                return None;
            };

            Some((id, call_site))
        })
        .collect::<Vec<_>>();

    let mut results = compilation
        .instantiate_all(requests.iter().flatten().cloned().collect())
        .into_iter();

    let rendered = requests
        .iter()
        .map(|request| {
            request.as_ref().ok_or(Abort)?;

            let id = results.next().ok_or(Abort)??;
            compilation.entry(id).map(|entry| entry.to_string()).ok_or(Abort)
        })
        .collect::<Vec<_>>();

    info!(
        "{} instantiation(s) in the table, {} use site(s) failed",
        compilation.table().len(),
        rendered.iter().filter(|result| result.is_err()).count()
    );

    rendered
}

/// A [`Handler`] that buffers every diagnostic and prints them sorted by
/// location, so the output doesn't depend on the order parallel workers
/// finish in.
#[derive(Debug, Default)]
struct Printer {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl<E: Report> Handler<E> for Printer {
    fn receive(&self, error: E) { self.diagnostics.lock().push(error.report()); }
}

impl Printer {
    /// Prints the buffered diagnostics to the standard error stream and
    /// returns how many there were.
    fn print(&self) -> usize {
        let mut diagnostics = std::mem::take(&mut *self.diagnostics.lock());
        diagnostics.sort();

        for diagnostic in &diagnostics {
            eprintln!("{diagnostic}\n");
        }

        diagnostics.len()
    }
}

/// Runs the program with the given arguments.
#[must_use]
pub fn run(arguments: Arguments) -> ExitCode {
    let loaded = arguments
        .config()
        .and_then(|config| Ok((config, Program::load(&arguments.file)?)));

    let (config, program) = match loaded {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("{}: {error}", Severity::Error);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "loaded `{}` with a budget of {} step(s)",
        arguments.file.display(),
        config.budget
    );

    let printer = Arc::new(Printer::default());
    let results = execute(program, config, printer.clone());

    for entry in results.iter().flatten() {
        println!("{entry}");
    }

    if printer.print() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod test;
