//! String Interpolation (C3): pluggable-delimiter template -> string.
//!
//! Grounded on the teacher's `interpreter/expansion/variable.rs` (`$VAR`/
//! `${VAR}` substitution), generalized from a hardwired `$` sigil to a
//! delimiter-pluggable `Interpolator` so ADDRESS targets that opt in to
//! "interpreter-handled interpolation" (SPEC_FULL.md §4.6) can still supply
//! their own resolver.

/// Resolves a bare variable name to its string form. Implemented by the
/// engine (backed by the `VariableStore`) and handed to `interpolate` so
/// ADDRESS handlers can also call it directly (SPEC_FULL.md §6
/// `sourceContext.interpolation`).
pub trait Resolver {
    fn resolve(&self, name: &str) -> String;
}

impl<F: Fn(&str) -> String> Resolver for F {
    fn resolve(&self, name: &str) -> String {
        self(name)
    }
}

/// Delimiter pair bracketing an interpolation placeholder. Default is
/// `{` / `}`, matching SAY/quoted-string templates; an ADDRESS target could
/// register its own (e.g. `${` / `}` ) without changing this module.
#[derive(Debug, Clone, Copy)]
pub struct Delimiters {
    pub open: char,
    pub close: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self { open: '{', close: '}' }
    }
}

/// Expand every `{name}` placeholder in `template` by calling `resolver`.
/// Unmatched/unterminated braces are passed through literally.
pub fn interpolate(template: &str, resolver: &dyn Resolver) -> String {
    interpolate_with(template, Delimiters::default(), resolver)
}

pub fn interpolate_with(template: &str, delims: Delimiters, resolver: &dyn Resolver) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == delims.open {
            let mut name = String::new();
            let mut closed = false;
            for nc in chars.by_ref() {
                if nc == delims.close {
                    closed = true;
                    break;
                }
                name.push(nc);
            }
            if closed && !name.is_empty() {
                out.push_str(&resolver.resolve(name.trim()));
            } else {
                out.push(delims.open);
                out.push_str(&name);
                if closed {
                    out.push(delims.close);
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Resolver + 'a {
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.to_string())
                .unwrap_or_default()
        }
    }

    #[test]
    fn substitutes_known_placeholder() {
        let r = resolver(&[("NAME", "world")]);
        assert_eq!(interpolate("hello {name}!", &r), "hello world!");
    }

    #[test]
    fn passes_through_unterminated_brace() {
        let r = resolver(&[]);
        assert_eq!(interpolate("a {b", &r), "a {b");
    }

    #[test]
    fn empty_braces_pass_through() {
        let r = resolver(&[]);
        assert_eq!(interpolate("a {} b", &r), "a {} b");
    }
}
