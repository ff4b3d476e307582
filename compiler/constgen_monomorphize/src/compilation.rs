//! Contains the [`Compilation`] context every declaration and use site goes
//! through.

use std::{collections::HashMap, sync::Arc};

use constgen_arena::{Arena, ID};
use constgen_diagnostic::Abort;
use constgen_evaluator::Evaluator;
use constgen_handler::Handler;
use constgen_term::{adt::AdtDefinition, expression::ConstExpr};
use constgen_type_system::{
    associated::{Implementation, Implementations, TraitDefinition},
    declaration::{Declaration, Item, OrderingMode},
    diagnostic::{Error, InvalidValueDomain, UnknownSymbol},
    domain::Validator,
    inference::CallSite,
    Environment,
};
use getset::{CopyGetters, Getters};
use log::{debug, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::table::{InstantiationEntry, InstantiationKey, InstantiationTable};

/// The settings of a compilation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, CopyGetters,
)]
#[serde(default)]
pub struct Config {
    /// The number of steps a single constant evaluation may take.
    #[get_copy = "pub"]
    pub budget: usize,

    /// The ordering rules of generic parameter lists.
    #[get_copy = "pub"]
    pub ordering: OrderingMode,
}

impl Config {
    /// The step budget used when none is configured.
    pub const DEFAULT_BUDGET: usize = 10_000;
}

impl Default for Config {
    fn default() -> Self {
        Self { budget: Self::DEFAULT_BUDGET, ordering: OrderingMode::Strict }
    }
}

/// Owns every declaration and instantiation of one compilation.
///
/// Declarations are added through `&mut self`; once they are in place, use
/// sites can be instantiated concurrently through `&self`.
#[derive(Getters, CopyGetters)]
pub struct Compilation {
    evaluator: Arc<dyn Evaluator>,

    /// The settings the compilation runs with.
    #[get_copy = "pub"]
    config: Config,

    handler: Arc<dyn Handler<Error>>,

    /// Knows every declared struct and enum.
    #[get = "pub"]
    validator: Validator,

    /// Knows every declared trait and implementation.
    #[get = "pub"]
    implementations: Implementations,

    declarations: Arena<Declaration>,
    names: HashMap<String, ID<Declaration>>,

    /// Every instantiation created so far.
    #[get = "pub"]
    table: InstantiationTable,
}

impl std::fmt::Debug for Compilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compilation")
            .field("config", &self.config)
            .field("declarations", &self.declarations)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Compilation {
    /// Creates an empty compilation reporting to `handler`.
    #[must_use]
    pub fn new(
        evaluator: Arc<dyn Evaluator>,
        config: Config,
        handler: Arc<dyn Handler<Error>>,
    ) -> Self {
        Self {
            evaluator,
            config,
            handler,
            validator: Validator::new(),
            implementations: Implementations::new(),
            declarations: Arena::new(),
            names: HashMap::new(),
            table: InstantiationTable::new(),
        }
    }

    /// Returns the environment the type system queries run in.
    #[must_use]
    pub fn environment(&self) -> Environment<'_> {
        Environment::new(&*self.evaluator, &self.validator, self.config.budget)
    }

    /// Declares a struct or enum.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting [`InvalidValueDomain`] for every
    /// value parameter whose domain has no usable equality.
    pub fn declare_adt(&mut self, adt: AdtDefinition) -> Result<(), Abort> {
        let mut failed = false;
        for (name, domain) in &adt.value_parameters {
            if !self.validator.classify(domain).is_eligible() {
                self.handler.receive(
                    InvalidValueDomain::new(
                        name.clone(),
                        domain.clone(),
                        None,
                        adt.span,
                    )
                    .into(),
                );
                failed = true;
            }
        }

        if failed {
            return Err(Abort);
        }

        debug!("declared {:?} `{}`", adt.kind, adt.name);
        if let Some(previous) = self.validator.declare_adt(adt) {
            warn!("`{}` is declared more than once", previous.name);
        }

        Ok(())
    }

    /// Declares a trait.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting [`InvalidValueDomain`] for every
    /// associated constant whose domain has no usable equality.
    pub fn declare_trait(
        &mut self,
        definition: TraitDefinition,
    ) -> Result<(), Abort> {
        let mut failed = false;
        for constant in &definition.constants {
            if !self.validator.classify(&constant.domain).is_eligible() {
                self.handler.receive(
                    InvalidValueDomain::new(
                        constant.name.clone(),
                        constant.domain.clone(),
                        None,
                        constant.span,
                    )
                    .into(),
                );
                failed = true;
            }
        }

        if failed {
            return Err(Abort);
        }

        if let Some(previous) = self.implementations.declare_trait(definition) {
            warn!("the trait `{}` is declared more than once", previous.name);
        }

        Ok(())
    }

    /// Declares a generic item and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] if the generic parameters of the item are invalid;
    /// see [`Declaration::declare`].
    pub fn declare_item(&mut self, item: Item) -> Result<ID<Declaration>, Abort> {
        let declaration = Declaration::declare(
            item,
            self.config.ordering,
            &self.validator,
            &*self.handler,
        )?;

        let name = declaration.name().clone();
        let id = self.declarations.insert(declaration);

        if self.names.insert(name.clone(), id).is_some() {
            warn!("`{name}` is declared more than once, the latest wins");
        }

        Ok(id)
    }

    /// Declares an implementation of a trait.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] if the implementation is invalid; see
    /// [`Implementations::declare_implementation`].
    pub fn declare_implementation(
        &mut self,
        implementation: Implementation,
    ) -> Result<(), Abort> {
        let environment = Environment::new(
            &*self.evaluator,
            &self.validator,
            self.config.budget,
        );

        self.implementations.declare_implementation(
            implementation,
            self.config.ordering,
            &environment,
            &*self.handler,
        )
    }

    /// Returns the handle of the item declared under `name`.
    #[must_use]
    pub fn item_by_name(&self, name: &str) -> Option<ID<Declaration>> {
        self.names.get(name).copied()
    }

    /// Returns the declaration behind the handle.
    #[must_use]
    pub fn declaration(&self, id: ID<Declaration>) -> Option<&Declaration> {
        self.declarations.get(id)
    }

    /// Returns the instantiation behind the handle.
    #[must_use]
    pub fn entry(
        &self,
        id: ID<InstantiationEntry>,
    ) -> Option<Arc<InstantiationEntry>> {
        self.table.get(id)
    }

    /// Instantiates the item for the use site: resolves its generic
    /// arguments, looks up the associated constants it refers to, checks its
    /// where clauses, and returns the handle of the deduplicated entry.
    ///
    /// # Errors
    ///
    /// Returns [`Abort`] after reporting the error to the handler; the table
    /// is left untouched.
    pub fn instantiate(
        &self,
        item: ID<Declaration>,
        call_site: &CallSite,
    ) -> Result<ID<InstantiationEntry>, Abort> {
        self.try_instantiate(item, call_site).map_err(|error| {
            debug!("failed to instantiate {item}: {error}");
            self.handler.receive(error);
            Abort
        })
    }

    fn try_instantiate(
        &self,
        item: ID<Declaration>,
        call_site: &CallSite,
    ) -> Result<ID<InstantiationEntry>, Error> {
        let declaration = self.declarations.get(item).ok_or_else(|| {
            UnknownSymbol::new(item.to_string(), call_site.span)
        })?;

        let environment = self.environment();
        let resolution = environment.resolve(declaration, call_site)?;
        let instantiation = resolution.instantiation();

        let mut signature_constants = Vec::<ConstExpr>::new();
        for ty in declaration
            .signature()
            .parameters
            .iter()
            .chain(&declaration.signature().return_type)
        {
            ty.for_each_constant(&mut |constant| {
                signature_constants.push(constant.clone());
            });
        }

        let associated = self.implementations.collect(
            &environment,
            declaration
                .where_clauses()
                .iter()
                .map(|clause| &clause.expression)
                .chain(&signature_constants),
            declaration.generic_parameters(),
            instantiation,
            call_site.span,
        )?;

        environment.check(
            declaration.where_clauses(),
            instantiation,
            &associated,
            call_site.span,
        )?;

        let signature = environment.instantiate_signature(
            declaration.signature(),
            instantiation,
            &associated,
            call_site.span,
        )?;

        let (arguments, _) = resolution.into_parts();
        let name = if arguments.types.is_empty() && arguments.constants.is_empty()
        {
            declaration.name().clone()
        } else {
            format!("{}{arguments}", declaration.name())
        };

        let key = InstantiationKey { item, arguments: arguments.clone() };

        Ok(self.table.get_or_create(key, || {
            InstantiationEntry::new(
                item,
                declaration.kind(),
                name,
                arguments,
                signature,
                associated,
            )
        }))
    }

    /// Instantiates every request, independent requests in parallel.
    ///
    /// The results are in the order of the requests; a failing request
    /// doesn't affect the others.
    pub fn instantiate_all(
        &self,
        requests: Vec<(ID<Declaration>, CallSite)>,
    ) -> Vec<Result<ID<InstantiationEntry>, Abort>> {
        requests
            .into_par_iter()
            .map(|(item, call_site)| self.instantiate(item, &call_site))
            .collect()
    }
}
