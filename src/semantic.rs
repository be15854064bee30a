//! Análisis semántico.
//!
//! Esta fase recorre el árbol sintáctico dos veces, siempre en modo de
//! solo lectura. Primero recolecta los nombres declarados y referenciados
//! en una [`Symbols`], y después verifica que todo dispositivo mencionado
//! por un comando haya sido declarado. Los errores se acumulan en vez de
//! abortar ante el primero, de modo que una sola ejecución reporta todas
//! las referencias indefinidas.

use bitflags::bitflags;
use log::{debug, warn};
use thiserror::Error;

use std::collections::{HashMap, HashSet};

use crate::{
    lex::Identifier,
    parse::{Action, Ast, Command, Condition, Value},
    source::Located,
};

pub type Semantic<T> = Result<T, Vec<Located<SemanticError>>>;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("Device '{0}' does not exist.")]
    UndefinedDevice(Identifier),
}

bitflags! {
    /// Formas en que un programa utiliza una variable.
    pub struct Usage: u8 {
        /// Aparece entre corchetes en la declaración de un dispositivo.
        const OBSERVED = 0x01;

        /// Es destino de un `def`.
        const ASSIGNED = 0x02;

        /// Se lee en una condición, en un valor o en una alerta.
        const READ = 0x04;

        /// Se lee al menos una vez antes de su primer `def`.
        const UNBOUND_READ = 0x08;
    }
}

/// Nombres recolectados de un programa ya validado.
///
/// Solo [`Ast::resolve()`] construye instancias de este tipo, por lo cual
/// su existencia implica que no hay referencias a dispositivos indefinidos.
#[derive(Debug)]
pub struct Symbols {
    devices: Vec<Identifier>,
    variables: Vec<(Identifier, Usage)>,
}

impl Symbols {
    /// Dispositivos declarados, en orden de declaración.
    pub fn devices(&self) -> &[Identifier] {
        &self.devices
    }

    /// Variables en orden de primera aparición.
    pub fn variables(&self) -> impl Iterator<Item = (&Identifier, Usage)> {
        self.variables.iter().map(|(name, usage)| (name, *usage))
    }

    /// Variables que pueden leerse sin haber recibido valor: las que
    /// nunca se asignan y las que se leen antes de su primer `def`.
    pub fn unbound(&self) -> impl Iterator<Item = &Identifier> {
        self.variables()
            .filter(|(_, usage)| {
                !usage.contains(Usage::ASSIGNED) || usage.contains(Usage::UNBOUND_READ)
            })
            .map(|(name, _)| name)
    }

    /// Variables asignadas por algún `def` pero leídas antes del primero.
    pub fn hoisted(&self) -> impl Iterator<Item = &Identifier> {
        self.variables()
            .filter(|(_, usage)| usage.contains(Usage::ASSIGNED | Usage::UNBOUND_READ))
            .map(|(name, _)| name)
    }
}

impl Ast {
    /// Recolecta símbolos y valida referencias a dispositivos.
    pub fn resolve(&self) -> Semantic<Symbols> {
        let mut context = Context::default();

        for device in self.devices() {
            context.declare(device.name());
            if let Some(observed) = device.observed() {
                context.usage(observed.val(), Usage::OBSERVED);
            }
        }

        for command in self.commands() {
            context.command(command);
        }

        let Context {
            devices,
            variables,
            errors,
            ..
        } = context;

        debug!(
            "Resolved {} devices, {} variables, {} errors",
            devices.len(),
            variables.len(),
            errors.len()
        );

        if errors.is_empty() {
            Ok(Symbols { devices, variables })
        } else {
            Err(errors)
        }
    }
}

#[derive(Default)]
struct Context {
    devices: Vec<Identifier>,
    declared: HashSet<Identifier>,
    variables: Vec<(Identifier, Usage)>,
    indices: HashMap<Identifier, usize>,
    errors: Vec<Located<SemanticError>>,
}

impl Context {
    fn declare(&mut self, name: &Located<Identifier>) {
        let id = name.val();

        // Se preserva la declaración repetida, solo se advierte
        if !self.declared.insert(id.clone()) {
            warn!("Device '{}' declared more than once at {}", id, name.location());
        }

        self.devices.push(id.clone());
    }

    fn usage(&mut self, name: &Identifier, mut usage: Usage) {
        let index = match self.indices.get(name) {
            Some(&index) => index,
            None => {
                let index = self.variables.len();
                self.indices.insert(name.clone(), index);
                self.variables.push((name.clone(), Usage::empty()));

                index
            }
        };

        let current = &mut self.variables[index].1;
        if usage.contains(Usage::READ) && !current.contains(Usage::ASSIGNED) {
            usage |= Usage::UNBOUND_READ;
        }

        *current |= usage;
    }

    fn device(&mut self, name: &Located<Identifier>) {
        let id = name.val();
        if !self.declared.contains(id) {
            self.errors.push(Located::at(
                SemanticError::UndefinedDevice(id.clone()),
                name.location().clone(),
            ));
        }
    }

    fn command(&mut self, command: &Command) {
        match command {
            Command::Assign { name, value } => {
                // El valor se evalúa antes de asignar, `def x = x` lee primero
                self.value(value);
                self.usage(name.val(), Usage::ASSIGNED);
            }

            Command::If { condition, then } => {
                self.condition(condition);
                self.action(then);
            }

            Command::IfElse {
                condition,
                then,
                otherwise,
            } => {
                self.condition(condition);
                self.action(then);
                self.action(otherwise);
            }

            Command::Action(action) => self.action(action),
        }
    }

    fn condition(&mut self, condition: &Condition) {
        match condition {
            Condition::Compare { lhs, rhs, .. } => {
                self.usage(lhs.val(), Usage::READ);
                self.value(rhs);
            }

            Condition::And(lhs, rhs) => {
                self.condition(lhs);
                self.condition(rhs);
            }
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Number(_) | Value::Boolean(_) => (),
            Value::Identifier(id) => self.usage(id.val(), Usage::READ),
        }
    }

    fn action(&mut self, action: &Action) {
        match action {
            Action::TurnOn(device) | Action::TurnOff(device) | Action::Alert { device, .. } => {
                self.device(device)
            }

            Action::AlertWithVar {
                device, variable, ..
            } => {
                self.device(device);
                self.usage(variable.val(), Usage::READ);
            }

            Action::Broadcast { devices, .. } => {
                for device in devices {
                    self.device(device);
                }
            }

            Action::BroadcastWithVar {
                variable, devices, ..
            } => {
                self.usage(variable.val(), Usage::READ);
                for device in devices {
                    self.device(device);
                }
            }
        }
    }
}
