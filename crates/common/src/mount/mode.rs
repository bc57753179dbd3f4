use super::MountError;

pub const DEFAULT_FILE_MODE: u32 = 0o644;
pub const DEFAULT_DIRECTORY_MODE: u32 = 0o755;

const SETUID: u32 = 0o4000;
const SETGID: u32 = 0o2000;
const STICKY: u32 = 0o1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    User,
    Group,
    Other,
}

impl Class {
    /// Position of the class's rwx triplet
    fn shift(self) -> u32 {
        match self {
            Class::User => 6,
            Class::Group => 3,
            Class::Other => 0,
        }
    }

    /// Every bit `=` clears for this class
    fn mask(self) -> u32 {
        match self {
            Class::User => 0o700 | SETUID,
            Class::Group => 0o070 | SETGID,
            Class::Other => 0o007 | STICKY,
        }
    }
}

/// Resolve a chmod style mode against the `current` one.
///
/// Accepts octal (`"755"`, `"0644"`) or comma separated symbolic
///  clauses like `"u+x"`, `"go-w"`, `"a=rX"` or `"+t"`. A clause
///  without a class applies to everyone. `X` only grants execute
///  to directories or to files some class can already execute.
pub fn parse_mode(mode: &str, current: u32, is_directory: bool) -> Result<u32, MountError> {
    let invalid = || MountError::InvalidMode(mode.to_string());
    if mode.is_empty() {
        return Err(invalid());
    }
    if mode.chars().all(|c| c.is_ascii_digit()) {
        if mode.len() > 4 {
            return Err(invalid());
        }
        return u32::from_str_radix(mode, 8).map_err(|_| invalid());
    }

    let mut result = current & 0o7777;
    for clause in mode.split(',') {
        let op_at = clause.find(['+', '-', '=']).ok_or_else(invalid)?;
        let (who, mut rest) = clause.split_at(op_at);

        let mut classes = Vec::with_capacity(3);
        for c in who.chars() {
            match c {
                'u' => classes.push(Class::User),
                'g' => classes.push(Class::Group),
                'o' => classes.push(Class::Other),
                'a' => classes.extend([Class::User, Class::Group, Class::Other]),
                _ => return Err(invalid()),
            }
        }
        if classes.is_empty() {
            classes.extend([Class::User, Class::Group, Class::Other]);
        }

        // a clause may chain operators, e.g. `u+r-w`
        while let Some(op) = rest.chars().next() {
            rest = &rest[1..];
            let end = rest.find(['+', '-', '=']).unwrap_or(rest.len());
            let (perms, tail) = rest.split_at(end);
            rest = tail;

            let executable = is_directory || result & 0o111 != 0;
            let mut bits = 0;
            for perm in perms.chars() {
                for class in &classes {
                    bits |= match perm {
                        'r' => 0o4 << class.shift(),
                        'w' => 0o2 << class.shift(),
                        'x' => 0o1 << class.shift(),
                        'X' if executable => 0o1 << class.shift(),
                        'X' => 0,
                        's' => match class {
                            Class::User => SETUID,
                            Class::Group => SETGID,
                            Class::Other => 0,
                        },
                        't' => match class {
                            Class::Other => STICKY,
                            _ => 0,
                        },
                        _ => return Err(invalid()),
                    };
                }
            }

            match op {
                '+' => result |= bits,
                '-' => result &= !bits,
                '=' => {
                    for class in &classes {
                        result &= !class.mask();
                    }
                    result |= bits;
                }
                _ => return Err(invalid()),
            }
        }
    }
    Ok(result)
}
