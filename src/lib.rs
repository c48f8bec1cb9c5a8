// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Riff: a columnar, stripe-oriented file format with index-column
//! predicate pushdown. See [`planner`] for the entry point into a read
//! session, [`predicate`] for the expression tree pushdown is built on.

pub mod codec;
pub mod compare;
pub mod config;
pub mod error;
pub mod filter;
pub mod header;
pub mod planner;
pub mod predicate;
pub mod reader;
pub mod schema;
pub mod state;
pub mod statistics;
pub mod stream;
pub mod stripe;
pub mod value;
