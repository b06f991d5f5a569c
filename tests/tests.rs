// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod analyzer;
mod engine;
mod lexer;
mod parser;
mod resolver;
