use console::{Emoji, style};

pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static PAPERCLIP: Emoji<'_, '_> = Emoji("📎 ", "");

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_reply(channel: &str, text: &str) {
    println!("{} {}", style(format!("[{}]", channel)).dim(), text);
}

pub fn print_attachment(filename: &str, comment: &str, content: &str) {
    println!("{} {}", PAPERCLIP, style(filename).bold().cyan());
    println!("{}", comment);
    println!("{}", style(content).dim());
}

/// A titled block of `command  description` lines for help output.
pub struct GuideSection {
    title: &'static str,
    rows: Vec<(&'static str, &'static str)>,
}

impl GuideSection {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &'static str, description: &'static str) -> Self {
        self.rows.push((name, description));
        self
    }

    pub fn print(&self) {
        println!("\n {}", style(self.title).bold().underlined());
        let width = self.rows.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
        for (name, description) in &self.rows {
            println!(
                "   {}  {}",
                style(format!("{:width$}", name, width = width)).green(),
                description
            );
        }
    }
}
