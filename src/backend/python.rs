//! Backend de Python.
//!
//! Además de las primitivas, el programa generado expone `DEVICES` con
//! todos los dispositivos declarados y predeclara en cero cada variable
//! observada o leída que ningún `def` asigna, o que se lee antes del
//! primer `def` que la asigna.

use crate::{
    codegen::{quote, Context, Primitive},
    lex::Identifier,
    semantic::Symbols,
};

use std::fmt::{self, Write};

const RUNTIME: &str = r#"def turn_on(device):
    print(f"{device} turned on!")


def turn_off(device):
    print(f"{device} turned off!")


def alert(device, message):
    print(f"{device} received alert: {message}")


def alert_with_var(device, message, value):
    print(f"{device} received alert: {message} {value}")


"#;

pub struct Emitter;

impl super::Emitter for Emitter {
    const TRUE: &'static str = "True";
    const FALSE: &'static str = "False";
    const AND: &'static str = "and";

    fn prologue<W: Write>(cx: &mut Context<'_, W>, symbols: &Symbols) -> fmt::Result {
        cx.output().write_str(RUNTIME)?;

        let devices = list(symbols.devices().iter());
        emit!(cx, "DEVICES = {}", devices)?;

        for variable in symbols.unbound() {
            emit!(cx, "{} = 0", variable)?;
        }

        emit!(cx, "")
    }

    fn epilogue<W: Write>(_cx: &mut Context<'_, W>) -> fmt::Result {
        Ok(())
    }

    fn assign<W: Write>(
        cx: &mut Context<'_, W>,
        name: &Identifier,
        value: &str,
        _first: bool,
    ) -> fmt::Result {
        emit!(cx, "{} = {}", name, value)
    }

    fn begin_if<W: Write>(cx: &mut Context<'_, W>, condition: &str) -> fmt::Result {
        emit!(cx, "if {}:", condition)?;

        cx.indent();
        Ok(())
    }

    fn begin_else<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result {
        cx.dedent();
        emit!(cx, "else:")?;

        cx.indent();
        Ok(())
    }

    fn end_if<W: Write>(cx: &mut Context<'_, W>) -> fmt::Result {
        cx.dedent();
        Ok(())
    }

    fn call<W: Write>(cx: &mut Context<'_, W>, primitive: Primitive, args: &[&str]) -> fmt::Result {
        emit!(cx, "{}({})", primitive, args.join(", "))
    }

}

/// Literal de lista con los nombres entre comillas.
fn list<'a>(names: impl Iterator<Item = &'a Identifier>) -> String {
    let names: Vec<_> = names.map(|name| quote(name.as_ref())).collect();
    format!("[{}]", names.join(", "))
}
