//! Generación de código.
//!
//! El recorrido del árbol es común a todos los lenguajes objetivo: cada
//! comando se traduce, en orden, a una o más sentencias. Los detalles de
//! sintaxis concreta se delegan a un [`Emitter`] por medio de la macro
//! `dispatch_backend!()`.

use std::{
    collections::HashSet,
    fmt::{self, Display, Write},
    marker::PhantomData,
};

use log::debug;

use crate::{
    backend::{Backend, Emitter},
    lex::Identifier,
    parse::{Action, Ast, Command, Condition, Value},
    semantic::Symbols,
};

/// Ancho de un nivel de indentación.
const INDENT: &str = "    ";

/// Una de las cuatro primitivas que todo programa generado define.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    TurnOn,
    TurnOff,
    Alert,
    AlertWithVar,
}

impl Display for Primitive {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Primitive::TurnOn => "turn_on",
            Primitive::TurnOff => "turn_off",
            Primitive::Alert => "alert",
            Primitive::AlertWithVar => "alert_with_var",
        };

        fmt.write_str(name)
    }
}

/// Contexto de emisión: destino de salida y nivel de indentación actual.
pub struct Context<'w, W> {
    output: &'w mut W,
    depth: usize,
}

impl<W: Write> Context<'_, W> {
    /// Acceso directo a la salida, sin indentación.
    pub fn output(&mut self) -> &mut W {
        self.output
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Escribe una línea completa al nivel de indentación actual.
    pub fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            self.output.write_str(INDENT)?;
        }

        self.output.write_fmt(args)?;
        self.output.write_char('\n')
    }
}

/// Traduce un programa validado al lenguaje del backend indicado.
///
/// Requerir [`Symbols`] garantiza que el programa ya pasó por análisis
/// semántico. Esta función no guarda estado entre invocaciones.
pub fn emit<W: Write>(
    ast: &Ast,
    symbols: &Symbols,
    backend: Backend,
    output: &mut W,
) -> fmt::Result {
    debug!(
        "Emitting {} commands for backend `{}`",
        ast.commands().len(),
        backend
    );

    let cx = Context { output, depth: 0 };
    dispatch_backend!(Target: backend => Translation::<Target, W>::new(cx).program(ast, symbols))
}

/// Representa un mensaje como literal de string entre comillas dobles.
///
/// Los mensajes no pueden contener comillas, pero sí `\`, que ambos
/// lenguajes objetivo interpretan como inicio de escape.
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);

    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '\\' | '"') {
            quoted.push('\\');
        }

        quoted.push(c);
    }
    quoted.push('"');

    quoted
}

struct Translation<'a, 'w, E, W> {
    cx: Context<'w, W>,
    declared: HashSet<&'a Identifier>,
    emitter: PhantomData<E>,
}

impl<'a, 'w, E: Emitter, W: Write> Translation<'a, 'w, E, W> {
    fn new(cx: Context<'w, W>) -> Self {
        Translation {
            cx,
            declared: HashSet::new(),
            emitter: PhantomData,
        }
    }

    fn program(mut self, ast: &'a Ast, symbols: &'a Symbols) -> fmt::Result {
        // Las variables que el prólogo ya declaró no se redeclaran
        self.declared.extend(symbols.hoisted());
        E::prologue(&mut self.cx, symbols)?;

        for command in ast.commands() {
            self.command(command)?;
        }

        E::epilogue(&mut self.cx)
    }

    fn command(&mut self, command: &'a Command) -> fmt::Result {
        match command {
            Command::Assign { name, value } => {
                let first = self.declared.insert(name.val());
                E::assign(&mut self.cx, name.val(), &value_of::<E>(value), first)
            }

            Command::If { condition, then } => {
                E::begin_if(&mut self.cx, &condition_of::<E>(condition))?;
                self.action(then)?;
                E::end_if(&mut self.cx)
            }

            Command::IfElse {
                condition,
                then,
                otherwise,
            } => {
                E::begin_if(&mut self.cx, &condition_of::<E>(condition))?;
                self.action(then)?;
                E::begin_else(&mut self.cx)?;
                self.action(otherwise)?;
                E::end_if(&mut self.cx)
            }

            Command::Action(action) => self.action(action),
        }
    }

    fn action(&mut self, action: &Action) -> fmt::Result {
        let cx = &mut self.cx;

        match action {
            Action::TurnOn(device) => {
                let device = quote(device.val().as_ref());
                E::call(cx, Primitive::TurnOn, &[device.as_str()])
            }

            Action::TurnOff(device) => {
                let device = quote(device.val().as_ref());
                E::call(cx, Primitive::TurnOff, &[device.as_str()])
            }

            Action::Alert { device, message } => {
                let (device, message) = (quote(device.val().as_ref()), quote(message));
                E::call(cx, Primitive::Alert, &[device.as_str(), message.as_str()])
            }

            Action::AlertWithVar {
                device,
                message,
                variable,
            } => {
                let (device, message) = (quote(device.val().as_ref()), quote(message));
                let args = [device.as_str(), message.as_str(), variable.val().as_ref()];

                E::call(cx, Primitive::AlertWithVar, &args)
            }

            Action::Broadcast { message, devices } => {
                let devices: Vec<_> = devices.iter().map(|device| device.val()).collect();
                E::broadcast(cx, &quote(message), None, &devices)
            }

            Action::BroadcastWithVar {
                message,
                variable,
                devices,
            } => {
                let devices: Vec<_> = devices.iter().map(|device| device.val()).collect();
                E::broadcast(cx, &quote(message), Some(variable.val()), &devices)
            }
        }
    }
}

fn condition_of<E: Emitter>(condition: &Condition) -> String {
    match condition {
        Condition::Compare { lhs, op, rhs } => {
            format!("{} {} {}", lhs.val(), op, value_of::<E>(rhs))
        }

        // El operando izquierdo se evalúa primero, con cortocircuito
        Condition::And(lhs, rhs) => format!(
            "({}) {} ({})",
            condition_of::<E>(lhs),
            E::AND,
            condition_of::<E>(rhs)
        ),
    }
}

fn value_of<E: Emitter>(value: &Value) -> String {
    match value {
        Value::Number(number) => number.to_string(),
        Value::Boolean(true) => String::from(E::TRUE),
        Value::Boolean(false) => String::from(E::FALSE),
        Value::Identifier(id) => id.val().to_string(),
    }
}
