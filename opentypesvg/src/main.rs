//! Command line interface for the `SVG ` table tools

use std::{convert::Infallible, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use opentypesvg::{
    add_svg_table, dump_svg_table, fonts_to_svg, parse_colors, paths::split_comma_sequence,
    AddOptions, DumpOptions, Error, Fonts2SvgOptions, HexColor,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add an SVG table to a font, using the SVG files in a folder.
    ///
    /// Each file is matched to the glyph with the same name as the file.
    Add {
        /// Do not make a copy of the font before modifying it
        #[arg(short = 'm')]
        no_font_copy: bool,

        /// Keep the viewBox on the root elements
        #[arg(short = 'k')]
        keep_view_box: bool,

        /// Also write WOFF and WOFF2 versions of the font
        #[arg(short = 'w')]
        generate_woffs: bool,

        /// Gzip the SVG documents
        #[arg(short = 'z')]
        compress: bool,

        /// Comma separated glyph names to ignore
        #[arg(short = 'x', value_name = "NAMES", value_parser = names)]
        exclude: Option<Names>,

        /// The folder of SVG files
        svg_folder: PathBuf,

        /// The font to modify
        font: PathBuf,
    },

    /// Save the contents of a font's SVG table as SVG files.
    Dump {
        /// The folder to save the files to [default: SVGs next to the font]
        #[arg(short = 'o', value_name = "FOLDER")]
        output_folder: Option<PathBuf>,

        /// Set the min-y of each viewBox to zero
        #[arg(short = 'r')]
        reset_view_box: bool,

        /// Comma separated glyph names to save
        #[arg(short = 'g', value_name = "NAMES", value_parser = names)]
        glyph_names: Option<Names>,

        /// Comma separated glyph names to skip
        #[arg(short = 'x', value_name = "NAMES", value_parser = names)]
        exclude: Option<Names>,

        /// The font to read
        font: PathBuf,
    },

    /// Draw the glyphs of one or more fonts as SVG files.
    ///
    /// Each font becomes a layer of the drawing, filled with its own color.
    Fonts2svg {
        /// Comma separated RRGGBB or RRGGBBAA fill colors, one per font
        #[arg(short = 'c', value_name = "COLORS", value_parser = colors)]
        colors: Option<Colors>,

        /// The folder to save the files to [default: SVGs next to the first font]
        #[arg(short = 'o', value_name = "FOLDER")]
        output_folder: Option<PathBuf>,

        /// Comma separated glyph names to draw
        #[arg(short = 'g', value_name = "NAMES", value_parser = names)]
        glyph_names: Option<Names>,

        /// Comma separated glyph names to draw along with the common ones
        #[arg(short = 'a', value_name = "NAMES", value_parser = names)]
        add_names: Option<Names>,

        /// Comma separated glyph names to skip
        #[arg(short = 'x', value_name = "NAMES", value_parser = names)]
        exclude: Option<Names>,

        /// Draw the glyphs of all fonts, not only the ones they share
        #[arg(short = 'u')]
        union: bool,

        /// Fit the viewBox to the font's bounding box
        #[arg(long = "adjust-viewbox", visible_alias = "av")]
        adjust_view_box: bool,

        /// The fonts to draw, bottom layer first
        #[arg(required = true)]
        fonts: Vec<PathBuf>,
    },
}

#[derive(Clone, Debug, Default)]
struct Names(Vec<String>);

fn names(input: &str) -> Result<Names, Infallible> {
    Ok(Names(split_comma_sequence(input)))
}

#[derive(Clone, Debug, Default)]
struct Colors(Vec<HexColor>);

fn colors(input: &str) -> Result<Colors, Error> {
    parse_colors(input).map(Colors)
}

fn unwrap_names(names: Option<Names>) -> Vec<String> {
    names.map(|names| names.0).unwrap_or_default()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let result = match args.command {
        Command::Add {
            no_font_copy,
            keep_view_box,
            generate_woffs,
            compress,
            exclude,
            svg_folder,
            font,
        } => {
            let options = AddOptions {
                make_font_copy: !no_font_copy,
                keep_view_box,
                generate_woffs,
                compress,
                exclude: unwrap_names(exclude),
            };
            add_svg_table(&svg_folder, &font, &options).map(|report| report.to_string())
        }
        Command::Dump {
            output_folder,
            reset_view_box,
            glyph_names,
            exclude,
            font,
        } => {
            let options = DumpOptions {
                output_folder,
                reset_view_box,
                glyph_names: unwrap_names(glyph_names),
                exclude: unwrap_names(exclude),
            };
            dump_svg_table(&font, &options).map(|report| report.to_string())
        }
        Command::Fonts2svg {
            colors,
            output_folder,
            glyph_names,
            add_names,
            exclude,
            union,
            adjust_view_box,
            fonts,
        } => {
            let options = Fonts2SvgOptions {
                colors: colors.map(|colors| colors.0).unwrap_or_default(),
                output_folder,
                glyph_names: unwrap_names(glyph_names),
                add_names: unwrap_names(add_names),
                exclude: unwrap_names(exclude),
                union,
                adjust_view_box,
            };
            fonts_to_svg(&fonts, &options).map(|report| report.to_string())
        }
    };

    match result {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(Error::NoSvgFiles) => {
            println!("{}", Error::NoSvgFiles);
            ExitCode::FAILURE
        }
        // the invalid paths have been reported already
        Err(Error::NoFonts) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts2svg(args: &[&str]) -> Command {
        let args = ["opentypesvg", "fonts2svg"].iter().chain(args).copied();
        Args::try_parse_from(args).unwrap().command
    }

    #[test]
    fn adjust_view_box_alias() {
        for flag in ["--adjust-viewbox", "--av"] {
            let Command::Fonts2svg {
                adjust_view_box,
                fonts,
                ..
            } = fonts2svg(&[flag, "font.ttf"])
            else {
                panic!("not fonts2svg");
            };
            assert!(adjust_view_box, "{flag}");
            assert_eq!(fonts, [PathBuf::from("font.ttf")]);
        }
    }

    #[test]
    fn comma_lists() {
        let Command::Fonts2svg {
            add_names,
            colors,
            adjust_view_box,
            ..
        } = fonts2svg(&["-a", "v,w", "-c", "ff0000,00ff0080", "font.ttf"])
        else {
            panic!("not fonts2svg");
        };
        assert_eq!(unwrap_names(add_names), ["v", "w"]);
        assert_eq!(colors.unwrap().0.len(), 2);
        assert!(!adjust_view_box);
    }

    #[test]
    fn fonts_are_required() {
        assert!(Args::try_parse_from(["opentypesvg", "fonts2svg", "-u"]).is_err());
    }
}
