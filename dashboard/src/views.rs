//! html pages
//!
//! Pages are small enough that plain `format!` does the job. Anything that
//! came from the config file or a form goes through [`escape`] first.
use std::fmt::Write;

use host_registry::Reservation;

/// escape text for use in html content and quoted attribute values
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <link rel="stylesheet" href="/dashboard.css">
</head>
<body>
<div class="page-container">
<div class="content-wrap">
{body}
</div>
<footer class="footer">&copy; <span id="current-year"></span> DHCP dashboard</footer>
</div>
<script>
    document.getElementById('current-year').textContent = new Date().getFullYear();
    function confirmRemove(hostname) {{
        return confirm(`Are you sure you want to remove the host "${{hostname}}"?`);
    }}
</script>
</body>
</html>
"#,
        title = escape(title),
    )
}

/// the main page: flashes, reservation table and every action form
pub(crate) fn dashboard(hosts: &[Reservation], flashes: &[String], service: &str) -> String {
    let mut body = String::from("<h1>DHCP Dashboard</h1>\n");

    for msg in flashes {
        let _ = writeln!(body, r#"<div class="flash">{}</div>"#, escape(msg));
    }

    body.push_str(
        "<h2>DHCP Hosts</h2>\n<table>\n<tr><th>Hostname</th><th>MAC Address</th><th>IP Address</th><th>Actions</th></tr>\n",
    );
    for host in hosts {
        let mac = escape(&host.mac);
        let hostname = escape(&host.hostname);
        let ip = host.ip.as_deref().map(escape).unwrap_or_else(|| "Dynamic".to_owned());
        let _ = writeln!(
            body,
            r#"<tr><td>{hostname}</td><td>{mac}</td><td>{ip}</td><td>
<a href="/edit?mac={mac}">Edit</a>
<form class="inline" method="post" action="/remove" onsubmit="return confirmRemove('{hostname}')">
<input type="hidden" name="mac" value="{mac}"><button type="submit">Remove</button>
</form></td></tr>"#
        );
    }
    body.push_str("</table>\n");

    let service = escape(service);
    let _ = write!(
        body,
        r#"<div class="forms">
<div class="form-container">
<h2>Add New Host</h2>
<form method="post" action="/">
<input type="hidden" name="action" value="add">
<label for="mac">MAC Address</label>
<input type="text" id="mac" name="mac" required>
<label for="hostname">Hostname</label>
<input type="text" id="hostname" name="hostname" required>
<label for="ip">IP Address (optional)</label>
<input type="text" id="ip" name="ip">
<input type="submit" value="Add Host">
</form>
</div>
<div class="form-container">
<h2>Service</h2>
<form method="post" action="/"><input type="hidden" name="action" value="restart"><input type="submit" value="Restart {service}"></form>
<form method="post" action="/"><input type="hidden" name="action" value="status"><input type="submit" value="Check {service} status"></form>
<form method="post" action="/"><input type="hidden" name="action" value="backup"><input type="submit" value="Backup config"></form>
<form method="post" action="/"><input type="hidden" name="action" value="shutdown"><input type="submit" value="Shutdown device"></form>
</div>
<div class="form-container">
<h2>Wi-Fi</h2>
<form method="post" action="/">
<input type="hidden" name="action" value="wifi">
<label for="ssid">Network name</label>
<input type="text" id="ssid" name="ssid" required>
<label for="psk">Password</label>
<input type="password" id="psk" name="psk" required>
<input type="submit" value="Apply Wi-Fi settings">
</form>
</div>
</div>
"#
    );

    layout("DHCP Dashboard", &body)
}

/// prefilled form for changing a single reservation
pub(crate) fn edit(host: &Reservation) -> String {
    let mac = escape(&host.mac);
    let hostname = escape(&host.hostname);
    let ip = host.ip.as_deref().map(escape).unwrap_or_default();
    let body = format!(
        r#"<div class="form-container">
<h1>Edit Host</h1>
<form method="post" action="/edit">
<input type="hidden" name="old_mac" value="{mac}">
<label for="new_mac">MAC Address</label>
<input type="text" id="new_mac" name="new_mac" value="{mac}" required>
<label for="new_hostname">Hostname</label>
<input type="text" id="new_hostname" name="new_hostname" value="{hostname}" required>
<label for="new_ip">IP Address (optional)</label>
<input type="text" id="new_ip" name="new_ip" value="{ip}">
<input type="submit" value="Update Host">
</form>
<a class="cancel-link" href="/">Cancel</a>
</div>
"#
    );
    layout("Edit Host", &body)
}

/// second step of the shutdown action
pub(crate) fn confirm_shutdown() -> String {
    let body = r#"<h1>Confirm Shutdown</h1>
<p class="warning">Are you sure you want to shut down the device? It will have to be powered on by hand.</p>
<form method="post" action="/">
<input type="hidden" name="action" value="confirm_shutdown">
<input type="submit" value="Yes, shut down">
</form>
<a class="cancel-link" href="/">Cancel</a>
"#;
    layout("Confirm Shutdown", body)
}
