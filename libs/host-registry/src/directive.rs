//! `dhcp-host=` directive parsing & formatting
//!
//! A reservation line looks like `dhcp-host=MAC,HOSTNAME[,IP]`. Every other
//! line in the file belongs to someone else and is carried through a rewrite
//! untouched.
use crate::Reservation;

/// prefix identifying a reservation line
pub const PREFIX: &str = "dhcp-host=";

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn is_mac_char(c: char) -> bool {
    is_word(c) || c == ':' || c == '-'
}

pub(crate) fn is_hostname_char(c: char) -> bool {
    is_word(c) || c == '.' || c == '-'
}

pub(crate) fn is_ip_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// split off the longest leading run of `accept` chars
fn take_while(s: &str, accept: impl Fn(char) -> bool) -> (&str, &str) {
    s.split_at(s.find(|c| !accept(c)).unwrap_or(s.len()))
}

/// `MAC,HOSTNAME[,IP]` following the prefix. Anything after the last field
/// that parses (lease time, tags) is ignored.
fn parse_line(line: &str) -> Option<Reservation> {
    // only at line start, so reads and rewrites agree on what a directive is
    // and a commented `#dhcp-host=` is left alone by both
    let rest = line.strip_prefix(PREFIX)?;
    let (mac, rest) = take_while(rest, is_mac_char);
    let rest = rest.strip_prefix(',').filter(|_| !mac.is_empty())?;
    let (hostname, rest) = take_while(rest, is_hostname_char);
    if hostname.is_empty() {
        return None;
    }
    let ip = rest
        .strip_prefix(',')
        .map(|rest| take_while(rest, is_ip_char).0)
        .filter(|ip| !ip.is_empty());

    Some(Reservation {
        mac: mac.to_owned(),
        hostname: hostname.to_owned(),
        ip: ip.map(str::to_owned),
    })
}

/// every reservation directive in `contents`, in file order
pub fn parse(contents: &str) -> Vec<Reservation> {
    contents.lines().filter_map(parse_line).collect()
}

/// format a single directive line, without trailing newline
pub fn format(res: &Reservation) -> String {
    match &res.ip {
        Some(ip) => format!("{PREFIX}{},{},{ip}", res.mac, res.hostname),
        None => format!("{PREFIX}{},{}", res.mac, res.hostname),
    }
}

/// Drop every line starting with [`PREFIX`] from `contents` and append one
/// directive per reservation. The result always ends in a newline.
pub fn render(contents: &str, reservations: &[Reservation]) -> String {
    let mut out = String::with_capacity(contents.len());
    for line in contents.lines().filter(|line| !line.starts_with(PREFIX)) {
        out.push_str(line);
        out.push('\n');
    }
    for res in reservations {
        out.push_str(&format(res));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: &str = "\
# dnsmasq.conf
interface=eth0
dhcp-range=192.168.1.100,192.168.1.200,12h
dhcp-host=aa:bb:cc:dd:ee:ff,printer,192.168.1.50
#dhcp-host=00:00:00:00:00:01,old-box,192.168.1.9
dhcp-host=11:22:33:44:55:66,laptop
domain=lan
";

    #[test]
    fn test_parse() {
        let hosts = parse(SAMPLE);
        assert_eq!(
            hosts,
            vec![
                Reservation {
                    mac: "aa:bb:cc:dd:ee:ff".into(),
                    hostname: "printer".into(),
                    ip: Some("192.168.1.50".into()),
                },
                Reservation {
                    mac: "11:22:33:44:55:66".into(),
                    hostname: "laptop".into(),
                    ip: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_hyphen_mac() {
        let hosts = parse("dhcp-host=AA-BB-CC-DD-EE-FF,nas.lan,10.0.0.4\n");
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].mac, "AA-BB-CC-DD-EE-FF");
        assert_eq!(hosts[0].hostname, "nas.lan");
        assert_eq!(hosts[0].ip.as_deref(), Some("10.0.0.4"));
    }

    #[test]
    fn test_parse_skips_malformed() {
        let hosts = parse(
            "dhcp-host=aa:bb:cc:dd:ee:ff\n\
             dhcp-host=,nohw\n\
             dhcp-host=aa:bb:cc:dd:ee:ff,\n\
             \x20dhcp-host=aa:bb:cc:dd:ee:01,indented\n\
             dhcp-host=aa:bb:cc:dd:ee:02,tv,set:iot\n\
             dhcp-host=aa:bb:cc:dd:ee:03,cam,10.0.0.9,infinite\n",
        );
        assert_eq!(
            hosts,
            vec![
                Reservation {
                    mac: "aa:bb:cc:dd:ee:02".into(),
                    hostname: "tv".into(),
                    ip: None,
                },
                Reservation {
                    mac: "aa:bb:cc:dd:ee:03".into(),
                    hostname: "cam".into(),
                    ip: Some("10.0.0.9".into()),
                },
            ]
        );
    }

    #[test]
    fn test_format() {
        let res = Reservation {
            mac: "11:22:33:44:55:66".into(),
            hostname: "laptop".into(),
            ip: None,
        };
        assert_eq!(format(&res), "dhcp-host=11:22:33:44:55:66,laptop");
        let res = Reservation {
            ip: Some("192.168.1.7".into()),
            ..res
        };
        assert_eq!(format(&res), "dhcp-host=11:22:33:44:55:66,laptop,192.168.1.7");
    }

    #[test]
    fn test_render_keeps_other_lines_in_order() {
        let hosts = vec![Reservation {
            mac: "de:ad:be:ef:00:01".into(),
            hostname: "tv".into(),
            ip: None,
        }];
        let out = render(SAMPLE, &hosts);
        assert_eq!(
            out,
            "\
# dnsmasq.conf
interface=eth0
dhcp-range=192.168.1.100,192.168.1.200,12h
#dhcp-host=00:00:00:00:00:01,old-box,192.168.1.9
domain=lan
dhcp-host=de:ad:be:ef:00:01,tv
"
        );
    }

    #[test]
    fn test_render_terminates_last_line() {
        let hosts = vec![Reservation {
            mac: "de:ad:be:ef:00:01".into(),
            hostname: "tv".into(),
            ip: None,
        }];
        assert_eq!(
            render("domain=lan", &hosts),
            "domain=lan\ndhcp-host=de:ad:be:ef:00:01,tv\n"
        );
        assert_eq!(render("", &[]), "");
    }
}
